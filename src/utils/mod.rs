pub mod currency;
pub mod locale;
pub mod password;
pub mod reference;
pub mod token;
pub mod sanitize;

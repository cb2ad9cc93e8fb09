pub mod addressmodel;
pub mod bookingmodel;
pub mod chatmodels;
pub mod contentmodel;
pub mod jobmodel;
pub mod notificationmodel;
pub mod reviewmodel;
pub mod taskermodel;
pub mod usermodel;
pub mod walletmodels;

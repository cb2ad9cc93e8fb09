pub mod addressdb;
pub mod bookingdb;
pub mod cache;
pub mod chatdb;
pub mod contentdb;
pub mod db;
pub mod jobdb;
pub mod notificationdb;
pub mod reviewdb;
pub mod taskerdb;
pub mod userdb;
pub mod walletdb;

pub mod bookingdtos;
pub mod chatdtos;
pub mod commondtos;
pub mod contentdtos;
pub mod jobdtos;
pub mod notificationdtos;
pub mod reviewdtos;
pub mod storagedtos;
pub mod taskerdtos;
pub mod userdtos;
pub mod walletdtos;

pub mod background_jobs;
pub mod booking_service;
pub mod error;
pub mod job_service;
pub mod notification_service;
pub mod realtime;
pub mod storage;
pub mod wallet_service;

pub mod admin;
pub mod auth;
pub mod bookings;
pub mod chat;
pub mod content;
pub mod jobs;
pub mod notifications;
pub mod realtime;
pub mod storage;
pub mod tasker;
pub mod users;
pub mod wallet;

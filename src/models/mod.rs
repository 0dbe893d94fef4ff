pub mod bookmark;
pub mod exam;
pub mod practice_session;
pub mod question;
pub mod subject;
pub mod user;
pub mod user_answer;
pub mod user_progress;

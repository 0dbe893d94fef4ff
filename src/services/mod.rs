pub mod access_service;
pub mod answer_service;
pub mod bookmark_service;
pub mod catalog_service;
pub mod progress_service;
pub mod question_bank_service;
pub mod question_service;
pub mod session_service;

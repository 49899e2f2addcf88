pub mod job;
pub mod matches;
pub mod profile;

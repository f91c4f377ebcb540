pub mod continent;
pub mod coordinate;
pub mod date_range;
pub mod event;
pub mod events_request;
pub mod occurrence;
pub mod timestamp;

pub mod aggregate;
pub mod analysis;
pub mod columns;
pub mod daily;
pub mod dates;
pub mod error;
pub mod fetch;
pub mod series;
pub mod survey;

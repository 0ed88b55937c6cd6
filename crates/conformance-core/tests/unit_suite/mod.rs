mod phases;
mod reporting;

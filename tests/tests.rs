mod fixtures;

mod dense;
mod serial;
mod sparse;

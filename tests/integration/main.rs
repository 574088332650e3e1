//! End-to-end tests running the term2svg binary against synthetic
//! script(1) recordings.

mod helpers;

mod convert_test;
mod poster_test;

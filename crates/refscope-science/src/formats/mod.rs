pub mod bibtex;

pub use bibtex::{generate_cite_key, to_bibtex};

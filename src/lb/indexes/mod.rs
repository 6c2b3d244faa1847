pub mod histograms;
pub mod index_gram;

//! Job-posting bias detection: lexical bias matching, a TF-IDF + bias + sentiment
//! feature pipeline and a multinomial logistic regression classifier.

pub mod analysis;
pub mod classifier;
pub mod config;
pub mod detection;
pub mod errors;
pub mod features;
pub mod lexicon;
pub mod model;
pub mod routes;
pub mod state;
pub mod training;

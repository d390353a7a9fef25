//! # Rezept-Scan
//!
//! Digitizes printed recipes: a photographed page runs through image
//! preprocessing and OCR, a heuristic parser turns the recognized text into
//! a structured recipe draft for a form to pre-populate, and a pure scaling
//! module re-renders ingredient amounts for any requested portion count.

pub mod config;
pub mod errors;
pub mod extraction;
pub mod parser;
pub mod portions;
pub mod preprocessing;
pub mod recognition;
pub mod validation;

// Re-export the pipeline surface for easier access
pub use config::ExtractionConfig;
pub use extraction::{extract_recipe, ConfidenceLevel, ExtractionOutcome};
pub use parser::{parse_lines, parse_recognized_text, IngredientGuess, ParsedRecipe};
pub use portions::{format_amount, scale_amount, scale_recipe, ScaleRequest, ScaledIngredient};
pub use recognition::{RecognitionEngine, TesseractEngine};

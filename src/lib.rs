//! Receiptron - receipt image to structured record conversion.
//!
//! A one-shot pipeline: locate a receipt photo, recognize its text with
//! the CLOVA OCR service, interpret the text with the Gemini generative
//! model, and persist the structured result as JSON.

pub mod cli;
pub mod config;
pub mod llm;
pub mod locator;
pub mod models;
pub mod ocr;
pub mod writer;

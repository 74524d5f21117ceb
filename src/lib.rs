//! helloivy - application-prep chat and contact form
//!
//! The server side exposes the contact form, the LLM chat proxy and the audio
//! socket. The client side holds the scripted conversation controller and the
//! audio chunk relay used by the `ivy` terminal client.

pub mod api;
pub mod config;
pub mod contact;
pub mod conversation;
pub mod db;
pub mod llm;
pub mod prompt;
pub mod relay;

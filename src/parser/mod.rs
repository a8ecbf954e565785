//! Packed frame file parsing functionality

pub mod frame_parser;

// Re-export the parsing functions
pub use frame_parser::{
    decode_frame_into, frame_record, parse_frame, parse_frame_into, parse_frame_trailer,
    raw_frame_counter,
};

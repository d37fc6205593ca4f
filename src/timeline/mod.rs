/// Sliding window of decoded video thumbnails.
pub mod thumbnails;

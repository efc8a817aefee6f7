//! Multipart part planning
//!
//! Splits an object into numbered byte ranges. Part numbers start at 1, as
//! S3 requires, and the last part may be shorter than the others.

/// One byte range of a multipart transfer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Part {
    /// 1-based part number
    pub number: i32,
    /// First byte (inclusive)
    pub start: u64,
    /// Last byte (exclusive)
    pub end: u64,
}

impl Part {
    /// Bytes covered by this part
    pub fn size(&self) -> u64 {
        self.end - self.start
    }

    /// HTTP `Range` header value for this part
    pub fn range_header(&self) -> String {
        format!("bytes={}-{}", self.start, self.end - 1)
    }
}

/// Calculate number of parts for a file
pub fn calculate_parts(file_size: u64, part_size: u64) -> usize {
    file_size.div_ceil(part_size) as usize
}

/// Get byte range for a part
pub fn part_byte_range(part_number: i32, part_size: u64, total_size: u64) -> (u64, u64) {
    let start = (part_number as u64 - 1) * part_size;
    let end = (start + part_size).min(total_size);
    (start, end)
}

/// Every part of an object of `total_size` bytes
pub fn plan_parts(total_size: u64, part_size: u64) -> Vec<Part> {
    (1..=calculate_parts(total_size, part_size) as i32)
        .map(|number| {
            let (start, end) = part_byte_range(number, part_size, total_size);
            Part { number, start, end }
        })
        .collect()
}

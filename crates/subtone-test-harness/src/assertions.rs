use subtone_core::PixelBuffer;

/// Assert that a buffer has the given dimensions and a matching data length.
pub fn assert_dimensions(buffer: &PixelBuffer, width: u32, height: u32) {
    assert_eq!(
        (buffer.width, buffer.height),
        (width, height),
        "buffer is {}x{}, expected {}x{}",
        buffer.width,
        buffer.height,
        width,
        height
    );
    assert_eq!(
        buffer.data.len(),
        width as usize * height as usize * 4,
        "buffer data length does not match {}x{}",
        width,
        height
    );
}

/// Assert the exact RGBA value of one pixel.
pub fn assert_pixel(buffer: &PixelBuffer, x: u32, y: u32, expected: [u8; 4]) {
    assert_eq!(
        buffer.pixel(x, y),
        &expected,
        "pixel ({}, {}) is {:?}, expected {:?}",
        x,
        y,
        buffer.pixel(x, y),
        expected
    );
}

/// Assert that every color channel of every pixel is either 0 or 255.
pub fn assert_binary(buffer: &PixelBuffer) {
    for (i, px) in buffer.data.chunks_exact(4).enumerate() {
        assert!(
            px[..3].iter().all(|&c| c == 0 || c == 255),
            "pixel ({}, {}) is {:?}, expected only 0 or 255 channels",
            i as u32 % buffer.width,
            i as u32 / buffer.width,
            px
        );
    }
}

/// Assert that every pixel has the given alpha.
pub fn assert_alpha(buffer: &PixelBuffer, alpha: u8) {
    for (i, px) in buffer.data.chunks_exact(4).enumerate() {
        assert_eq!(
            px[3],
            alpha,
            "pixel ({}, {}) has alpha {}, expected {}",
            i as u32 % buffer.width,
            i as u32 / buffer.width,
            px[3],
            alpha
        );
    }
}

/// Assert two buffers of equal size differ by at most `tolerance` in any
/// channel.
pub fn assert_buffers_close(actual: &PixelBuffer, expected: &PixelBuffer, tolerance: u8) {
    assert_dimensions(actual, expected.width, expected.height);
    for (i, (a, e)) in actual.data.iter().zip(&expected.data).enumerate() {
        let px = (i / 4) as u32;
        assert!(
            a.abs_diff(*e) <= tolerance,
            "channel {} of pixel ({}, {}) is {}, expected {} +/- {}",
            i % 4,
            px % actual.width,
            px / actual.width,
            a,
            e,
            tolerance
        );
    }
}

/// Assert that a sequence of values never decreases.
pub fn assert_non_decreasing(values: &[f32], what: &str) {
    for (i, pair) in values.windows(2).enumerate() {
        assert!(
            pair[0] <= pair[1],
            "{} decreases at index {}: {} > {}",
            what,
            i,
            pair[0],
            pair[1]
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_buffers_close_accepts_tolerance() {
        let a = PixelBuffer::filled(2, 2, [10, 20, 30, 255]);
        let b = PixelBuffer::filled(2, 2, [11, 19, 30, 255]);
        assert_buffers_close(&a, &b, 1);
    }

    #[test]
    #[should_panic(expected = "expected only 0 or 255")]
    fn test_binary_rejects_gray() {
        assert_binary(&PixelBuffer::filled(1, 1, [128, 0, 0, 255]));
    }
}

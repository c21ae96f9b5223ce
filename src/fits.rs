//! FITS decoding: the primary HDU of a 2-D image, from in-memory bytes.
//!
//! A FITS file is a sequence of 2880-byte blocks. The header blocks hold
//! 80-character keyword cards up to an END card; the data area follows,
//! big-endian, scaled by BSCALE/BZERO. Objects compressed as `.fits.bz2`
//! or `.fits.gz` are sniffed by magic number and decompressed first.

use bzip2::read::BzDecoder;
use flate2::read::GzDecoder;
use ndarray::Array2;
use std::io::Read;

const BLOCK_SIZE: usize = 2880;
const CARD_SIZE: usize = 80;

/// Decode image bytes into a `height x width` grid of intensities.
pub fn decode_image(data: &[u8]) -> Result<Array2<f64>, String> {
    let data = decompress(data)?;
    let header = parse_header(&data)?;
    read_data(&data, &header)
}

fn decompress(data: &[u8]) -> Result<Vec<u8>, String> {
    if data.starts_with(b"BZh") {
        let mut out = Vec::new();
        BzDecoder::new(data)
            .read_to_end(&mut out)
            .map_err(|e| format!("bzip2 decompression failed: {e}"))?;
        Ok(out)
    } else if data.starts_with(&[0x1f, 0x8b]) {
        let mut out = Vec::new();
        GzDecoder::new(data)
            .read_to_end(&mut out)
            .map_err(|e| format!("gzip decompression failed: {e}"))?;
        Ok(out)
    } else {
        Ok(data.to_vec())
    }
}

struct Header {
    bitpix: i32,
    /// Axis lengths, NAXIS1 first (columns, then rows, then planes).
    axes: Vec<usize>,
    bscale: f64,
    bzero: f64,
    /// Byte offset of the data area (first block after the END card).
    data_start: usize,
}

fn parse_header(data: &[u8]) -> Result<Header, String> {
    if data.len() < BLOCK_SIZE {
        return Err("file is shorter than one FITS block".to_string());
    }
    if !data.starts_with(b"SIMPLE") {
        return Err("missing SIMPLE keyword; not a FITS file".to_string());
    }

    let mut keywords: Vec<(String, String)> = Vec::new();
    let mut data_start = None;

    'blocks: for block_start in (0..data.len()).step_by(BLOCK_SIZE) {
        let block = data
            .get(block_start..block_start + BLOCK_SIZE)
            .ok_or_else(|| "FITS header is truncated".to_string())?;

        for card_start in (0..BLOCK_SIZE).step_by(CARD_SIZE) {
            let card = &block[card_start..card_start + CARD_SIZE];
            let keyword = std::str::from_utf8(&card[..8])
                .map_err(|_| "non-ASCII bytes in FITS header".to_string())?
                .trim_end()
                .to_string();

            if keyword == "END" {
                data_start = Some(block_start + BLOCK_SIZE);
                break 'blocks;
            }

            // Only value cards ("KEY     = value / comment") matter here.
            if card[8] == b'=' && card[9] == b' ' {
                let value_field = std::str::from_utf8(&card[10..])
                    .map_err(|_| "non-ASCII bytes in FITS header".to_string())?;
                let value = value_field
                    .split('/')
                    .next()
                    .unwrap_or_default()
                    .trim()
                    .to_string();
                keywords.push((keyword, value));
            }
        }
    }

    let data_start = data_start.ok_or_else(|| "FITS header has no END card".to_string())?;

    let get = |key: &str| {
        keywords
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    };

    let bitpix: i32 = get("BITPIX")
        .ok_or_else(|| "missing BITPIX keyword".to_string())?
        .parse()
        .map_err(|_| "invalid BITPIX value".to_string())?;

    let naxis: usize = get("NAXIS")
        .ok_or_else(|| "missing NAXIS keyword".to_string())?
        .parse()
        .map_err(|_| "invalid NAXIS value".to_string())?;

    let mut axes = Vec::with_capacity(naxis);
    for i in 1..=naxis {
        let key = format!("NAXIS{i}");
        let len: usize = get(&key)
            .ok_or_else(|| format!("missing {key} keyword"))?
            .parse()
            .map_err(|_| format!("invalid {key} value"))?;
        axes.push(len);
    }

    let bscale = get("BSCALE").and_then(|v| v.parse().ok()).unwrap_or(1.0);
    let bzero = get("BZERO").and_then(|v| v.parse().ok()).unwrap_or(0.0);

    Ok(Header {
        bitpix,
        axes,
        bscale,
        bzero,
        data_start,
    })
}

fn read_data(data: &[u8], header: &Header) -> Result<Array2<f64>, String> {
    let (width, height) = match header.axes.as_slice() {
        [w, h] => (*w, *h),
        // A degenerate third axis still describes a single 2-D plane.
        [w, h, 1] => (*w, *h),
        shape => {
            return Err(format!(
                "expected a 2-D image, got NAXIS={} with shape {shape:?}",
                shape.len()
            ))
        }
    };

    if width == 0 || height == 0 {
        return Err("image has a zero-size dimension".to_string());
    }

    let bytes_per_pixel = (header.bitpix.unsigned_abs() / 8) as usize;
    let npix = width
        .checked_mul(height)
        .ok_or_else(|| "image dimensions overflow".to_string())?;
    let nbytes = npix * bytes_per_pixel;
    let raw = data
        .get(header.data_start..header.data_start + nbytes)
        .ok_or_else(|| "FITS data area is truncated".to_string())?;

    let mut values = Vec::with_capacity(npix);
    match header.bitpix {
        8 => values.extend(raw.iter().map(|&b| b as f64)),
        16 => values.extend(
            raw.chunks_exact(2)
                .map(|c| i16::from_be_bytes([c[0], c[1]]) as f64),
        ),
        32 => values.extend(
            raw.chunks_exact(4)
                .map(|c| i32::from_be_bytes([c[0], c[1], c[2], c[3]]) as f64),
        ),
        -32 => values.extend(
            raw.chunks_exact(4)
                .map(|c| f32::from_be_bytes([c[0], c[1], c[2], c[3]]) as f64),
        ),
        -64 => values.extend(
            raw.chunks_exact(8)
                .map(|c| f64::from_be_bytes([c[0], c[1], c[2], c[3], c[4], c[5], c[6], c[7]])),
        ),
        other => return Err(format!("unsupported BITPIX {other}")),
    }

    if header.bscale != 1.0 || header.bzero != 0.0 {
        for v in &mut values {
            *v = *v * header.bscale + header.bzero;
        }
    }

    Array2::from_shape_vec((height, width), values)
        .map_err(|e| format!("could not shape image data: {e}"))
}

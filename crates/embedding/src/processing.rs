//! Prompt formatting and input preprocessing for the ColPali model.

use image::DynamicImage;
use image::imageops::FilterType;

/// Beginning-of-sequence marker of the PaliGemma tokenizer.
pub const BOS_TOKEN: &str = "<bos>";

/// Placeholder the vision tower expands into one image patch.
pub const IMAGE_TOKEN: &str = "<image>";

/// Query augmentation token appended after every question.
pub const QUERY_AUGMENTATION_TOKEN: &str = "<unused0>";

/// Number of augmentation tokens appended to a query.
pub const QUERY_AUGMENTATION_COUNT: usize = 5;

/// Text prompt paired with every page image.
pub const IMAGE_PROMPT: &str = "Describe the image.";

/// Tokens that close every query prompt.
pub fn query_suffix() -> String {
    let mut suffix = QUERY_AUGMENTATION_TOKEN.repeat(QUERY_AUGMENTATION_COUNT);
    suffix.push('\n');
    suffix
}

/// Formats a query for the text tower: `<bos>Question: {query}` plus augmentation tokens.
pub fn format_query(query: &str) -> String {
    format!("{BOS_TOKEN}Question: {query}{}", query_suffix())
}

/// Formats the prompt that accompanies an image: one `<image>` token per patch, then the
/// description request.
pub fn format_image_prompt(image_seq_len: usize) -> String {
    format!(
        "{}{BOS_TOKEN}{IMAGE_PROMPT}\n",
        IMAGE_TOKEN.repeat(image_seq_len)
    )
}

/// Caps a tokenized query at `max_len` ids while keeping its last `suffix_len` ids.
///
/// The augmentation suffix always survives so that truncated queries still end the
/// way the model was trained on.
pub fn truncate_query_ids(mut ids: Vec<u32>, suffix_len: usize, max_len: usize) -> Vec<u32> {
    if ids.len() <= max_len || suffix_len >= max_len {
        return ids;
    }
    let suffix = ids.split_off(ids.len() - suffix_len);
    ids.truncate(max_len - suffix_len);
    ids.extend(suffix);
    ids
}

/// Resizes an image to a `size` x `size` RGB square and returns channel-first pixels
/// scaled to `[-1, 1]`.
pub fn image_to_chw(image: &DynamicImage, size: u32) -> Vec<f32> {
    let rgb = image
        .resize_exact(size, size, FilterType::CatmullRom)
        .to_rgb8();
    let plane = (size as usize) * (size as usize);
    let mut out = vec![0.0_f32; plane * 3];
    for (i, pixel) in rgb.pixels().enumerate() {
        for (c, value) in pixel.0.iter().enumerate() {
            out[c * plane + i] = f32::from(*value) * (2.0 / 255.0) - 1.0;
        }
    }
    out
}

/// Splits `len` items into consecutive `(start, end)` ranges of at most `batch_size`.
pub fn batch_ranges(len: usize, batch_size: usize) -> Vec<(usize, usize)> {
    let step = batch_size.max(1);
    (0..len)
        .step_by(step)
        .map(|start| (start, (start + step).min(len)))
        .collect()
}

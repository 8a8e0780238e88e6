//! Instruction prompt sent alongside the person and garment images.

use crate::image::AspectRatio;

/// Builds the instruction for one try-on render.
///
/// The output depends only on the arguments. Instructions are trimmed, and
/// are left out entirely when nothing remains.
pub fn compose_prompt(aspect_ratio: AspectRatio, instructions: &str) -> String {
    let mut prompt = format!(
        "You are an expert virtual stylist AI.\n\
         Your task is to generate a photorealistic image of the person from the first image \
         wearing the garment from the second image.\n\
         - Seamlessly blend the clothing onto the person, respecting their body shape, pose, \
         and the lighting of the original photo.\n\
         - The output should be a high-quality, realistic image.\n\
         - The final image MUST have a {aspect_ratio} aspect ratio.\n\
         - The background should be clean and neutral, enhancing the focus on the person \
         and the new outfit."
    );

    let instructions = instructions.trim();
    if !instructions.is_empty() {
        prompt.push_str("\n- Additional user instructions: ");
        prompt.push_str(instructions);
    }

    prompt
}

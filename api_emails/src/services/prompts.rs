//! Instructions sent to the composer ahead of the user's input.

const GENERATION_INSTRUCTIONS: &str = "\
You write high-converting cold emails. Write a professional cold email from the \
request below. Keep it concise, engaging and respectful, and end with a clear \
call to action. After the email, add a short section of suggestions for \
improving it. Use bullet points (•) in that section and bold only titles or key \
points. Do not introduce the email with phrases such as \"here is your email\".";

const REFINEMENT_INSTRUCTIONS: &str = "\
You refine cold emails. Apply the requested modification to the base email \
while keeping its core message, its tone and what earlier refinements already \
improved. Keep it concise and professional with a clear call to action. \
Respond with the refined email only, without any introduction, commentary or \
extra sections.";

pub fn generation_prompt(request: &str) -> String {
    format!("{}\n\nRequest:\n{}", GENERATION_INSTRUCTIONS, request.trim())
}

pub fn refinement_prompt(base_email: &str, modification: &str, previous: &[String]) -> String {
    let mut prompt = format!(
        "{}\n\nBase email:\n{}\n\nRequested modification:\n{}",
        REFINEMENT_INSTRUCTIONS,
        base_email.trim(),
        modification.trim()
    );
    if !previous.is_empty() {
        prompt.push_str("\n\nPrevious refinements:");
        for refinement in previous {
            prompt.push_str("\n• ");
            prompt.push_str(refinement.trim());
        }
    }
    prompt
}

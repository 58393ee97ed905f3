//! Post prompt with the per-platform style rules

use crate::social::{Platform, PostRequest};

const PLATFORM_RULES: &str = "Platform Rules (Very Important — Follow Strictly)
1. LinkedIn Rules

Tone: Professional, expert, industry-insightful.

Structure:
Strong hook (insight/statistic/problem).
2–3 short paragraphs.
Optional: Expertise statement about the company.
Soft call-to-action.

Length Guidance:
Short → 1–2 sharp professional lines
Medium → 4–6 informative lines
Long → Mini storytelling + value points

Headings/Subheadings:
Allowed (Example: “Key Insights”, “Here’s How It Helps”)

Formatting:
No emojis OR minimal (1–2 max)
Max 4 hashtags
No line breaks spam

Goal: Establish authority & expertise.

2. Facebook Rules
Tone: Friendly, conversational, easy-to-understand.

Structure:
Relatable hook
Problem + solution
Light promotion
Clear CTA

Length Guidance:
Short → 1–2 conversational lines
Medium → 3–5 lines in a friendly tone
Long → Story-style with simple language

Headings/Subheadings:
Optional but simple

Formatting:
Emojis allowed
8–12 hashtags

Goal: Engagement + user interaction.

3. Instagram Rules
Tone: Short, trendy, emotional, aesthetic.

Structure:
One-line punchy hook
2–3 short bullet points or lines
Strong CTA (DM / Follow / Save)

Length Guidance:

Short → 1 aesthetic line
Medium → 3–5 lines with spacing
Long → Short storytelling but still compact

Headings/Subheadings:
Not required (IG prefers clean captions)

Formatting:

Emojis allowed
Line breaks
10–15 hashtags

Goal: Aesthetic engagement + saves + shares.

Common Requirements for All Platforms
Auto-adjust tone based on selected platform.

Word count must follow selected post length:
Short → 1–2 lines
Medium → 3–5 lines
Long → Storytelling style

Auto-generate hashtags:
LinkedIn: Max 4
Facebook: 8–12
Instagram: 10–15

Use inputs naturally within the content.

Content must be original, engaging, and platform-optimized.
---
";

/// Instructions for one social post
pub fn build_post_prompt(request: &PostRequest) -> String {
    format!(
        "You are an expert social media content creator.
Generate a highly engaging, platform-optimized post.

Inputs:

Category: {category}

Topic: {topic}

Platform: {platform}

Post Length: {length}

Company Overview: {overview}

{rules}",
        category = request.category.trim(),
        topic = request.topic_line(),
        platform = request.platform,
        length = request.length,
        overview = request.overview.trim(),
        rules = PLATFORM_RULES,
    )
}

/// Instructions for the image that accompanies a post
pub fn image_prompt(post_text: &str, platform: Platform) -> String {
    format!(
        "Create a modern, aesthetic, scroll-stopping social media image
inspired by this post content:

\"\"\"{post_text}\"\"\"

Requirements:
- Match emotional tone of the post.
- Style must match platform: {platform}
- Clean, modern, professional.
- No text inside image.
"
    )
}

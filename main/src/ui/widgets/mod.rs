pub mod screen_prompt;

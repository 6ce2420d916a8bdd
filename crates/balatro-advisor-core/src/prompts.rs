//! Fixed instruction templates sent with every analysis request.
//!
//! Prompt content is kept apart from capture and dispatch so that it can be
//! compared and reviewed without touching either.

/// System role description shared by all analysis kinds.
pub const SYSTEM_PROMPT: &str = "You are an expert Balatro player and advisor. Your analysis should be:
1. Detailed and specific
2. Focused on strategic decision-making
3. Consider both immediate and long-term implications
4. Provide clear, actionable advice
5. Explain your reasoning
Format your response in clear sections with bullet points where appropriate.
Always end your analysis with '--- Analysis Complete ---'";

/// Instructions for reviewing the hand currently on the table.
pub const HAND_PROMPT: &str = "Analyze this Balatro game state and provide detailed advice on the current hand.

Please provide a comprehensive analysis covering:

1. Current Hand Analysis:
   - List all cards in hand
   - Identify any special combinations or synergies
   - Evaluate the hand's potential scoring

2. Joker Effects:
   - List all active jokers
   - Explain how they affect the current hand
   - Identify any powerful combinations

3. Game State:
   - Current score and target
   - Cards remaining in deck
   - Any active tarot or planet effects

4. Strategic Recommendations:
   - Best play options
   - Risk assessment
   - Alternative strategies

Format your response in clear sections with bullet points for easy reading.";

/// Instructions for reviewing the shop screen.
pub const SHOP_PROMPT: &str = "Analyze this Balatro shop and provide detailed purchase recommendations.

Please provide a comprehensive analysis covering:

1. Available Items:
   - List all jokers with their prices
   - List any tarot or planet cards
   - Note any special items or effects

2. Current Resources:
   - Available money
   - Current deck composition
   - Active jokers and their effects

3. Strategic Value:
   - Rate each item's value (High/Medium/Low)
   - Explain synergies with current setup
   - Consider long-term potential

4. Purchase Recommendations:
   - Prioritized list of items to buy
   - Alternative options
   - Items to avoid and why

Format your response in clear sections with bullet points for easy reading.";

/// Instructions for reviewing the run as a whole.
pub const GAME_STATE_PROMPT: &str = "Analyze this Balatro game state and provide comprehensive strategic advice.

Please provide a detailed analysis covering:

1. Overall Game Progress:
   - Current round/level
   - Score and win conditions
   - Available resources

2. Deck Composition:
   - Current deck strength
   - Key cards and combinations
   - Areas for improvement

3. Active Effects:
   - Joker synergies and combinations
   - Tarot and planet card effects
   - Special conditions or modifiers

4. Strategic Outlook:
   - Short-term goals (next 1-2 rounds)
   - Long-term strategy
   - Risk assessment

5. Recommendations:
   - Immediate actions to take
   - Shop priorities
   - Deck building suggestions

Format your response in clear sections with bullet points for easy reading.";

/// The three analyses a user can request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AnalysisKind {
    /// Cards in hand, jokers, and the best play.
    Hand,
    /// Shop contents and purchase priorities.
    Shop,
    /// Overall run progress and long-term strategy.
    GameState,
}

impl AnalysisKind {
    /// All kinds in button order.
    pub const ALL: [AnalysisKind; 3] = [
        AnalysisKind::Hand,
        AnalysisKind::Shop,
        AnalysisKind::GameState,
    ];

    /// Returns the fixed user prompt for this kind.
    pub fn prompt(self) -> &'static str {
        match self {
            AnalysisKind::Hand => HAND_PROMPT,
            AnalysisKind::Shop => SHOP_PROMPT,
            AnalysisKind::GameState => GAME_STATE_PROMPT,
        }
    }

    /// Returns the label shown on the triggering button.
    pub fn button_label(self) -> &'static str {
        match self {
            AnalysisKind::Hand => "Analyze Current Hand",
            AnalysisKind::Shop => "Analyze Shop",
            AnalysisKind::GameState => "Analyze Game State",
        }
    }

    /// Returns the status line text shown while the analysis runs.
    pub fn working_status(self) -> &'static str {
        match self {
            AnalysisKind::Hand => "Analyzing current hand...",
            AnalysisKind::Shop => "Analyzing shop...",
            AnalysisKind::GameState => "Analyzing game state...",
        }
    }

    /// Short stable name used in log fields.
    pub fn as_str(self) -> &'static str {
        match self {
            AnalysisKind::Hand => "hand",
            AnalysisKind::Shop => "shop",
            AnalysisKind::GameState => "game_state",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_kind_has_a_distinct_prompt() {
        let prompts: Vec<&str> = AnalysisKind::ALL.iter().map(|kind| kind.prompt()).collect();
        assert_ne!(prompts[0], prompts[1]);
        assert_ne!(prompts[1], prompts[2]);
        assert_ne!(prompts[0], prompts[2]);
    }

    #[test]
    fn prompts_close_with_formatting_instruction() {
        for kind in AnalysisKind::ALL {
            assert!(
                kind.prompt()
                    .ends_with("bullet points for easy reading."),
                "{kind:?} prompt should end with the formatting instruction"
            );
        }
        assert!(SYSTEM_PROMPT.ends_with("'--- Analysis Complete ---'"));
    }
}

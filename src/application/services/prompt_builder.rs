//! Prompt builder - Requests and corrective feedback for the generator
//!
//! Builds the instruction text sent to the external generator: the current
//! state serialized as structured context, the user's natural-language
//! request, and an explicit output-schema contract. Also builds the
//! corrective-feedback prompt used for the single retry, which enumerates
//! every violated invariant together with the computed metrics.

use crate::application::services::structure_validator::StructureMetrics;
use crate::application::services::ComboOption;
use crate::domain::entities::{Adventure, EncounterNode, MonsterMetadata};
use crate::domain::value_objects::{DifficultyTier, PartyProfile, XpWindow};

/// Builds generator prompts
pub struct PromptBuilder;

impl PromptBuilder {
    pub fn new() -> Self {
        Self
    }

    /// System prompt establishing the generator's role and the hard rule
    /// that it answers with exactly one JSON object
    pub fn system_prompt(&self) -> String {
        r#"You are a collaborator helping design a tabletop RPG adventure.

You MUST respond with exactly one JSON object and nothing else. No prose
before or after it. The required schema for the object is given in each
request; every field listed there is mandatory. Responses that do not match
the schema are discarded."#
            .to_string()
    }

    /// Request a structure proposal
    pub fn structure_request(&self, adventure: &Adventure, user_request: &str) -> String {
        let mut prompt = String::new();

        prompt.push_str("CURRENT ADVENTURE STRUCTURE:\n");
        if adventure.node_count() == 0 {
            prompt.push_str("(empty - no encounters yet)\n");
        } else {
            for node in adventure.nodes() {
                prompt.push_str(&format!(
                    "- {} \"{}\" [{}]{}\n",
                    node.id,
                    node.title,
                    node.encounter_type.display_name(),
                    if node.is_ending { " (ending)" } else { "" }
                ));
            }
            for connection in adventure.connections() {
                prompt.push_str(&format!("- {} -> {}\n", connection.from, connection.to));
            }
        }

        prompt.push_str(&format!("\nUSER REQUEST:\n{}\n", user_request));

        prompt.push_str(r#"
RESPONSE SCHEMA (all listed fields required):
{
  "type": "structure",
  "cards_to_add": [{"id": "card-1", "title": "...", "description": "...",
                    "encounter_type": "combat|social|investigation|puzzle|hazard|chase|survival|skill-challenge",
                    "x": 0, "y": 0, "difficulty": "low|moderate|high", "is_ending": false}],
  "edits": [{"id": "<existing node uuid>", "title": "...", "description": "..."}],
  "connections": [{"from": "card-1", "to": "card-2"}],
  "explanation": "why this structure fits the request"
}

Connections always flow left to right: "from" is the earlier encounter.
Every encounter that is not an ending must lead somewhere. Use the node
UUIDs above to reference existing encounters, and your own card ids for new
ones."#);

        prompt
    }

    /// Request a creature line-up for one encounter
    pub fn monster_request(
        &self,
        encounter: &EncounterNode,
        party: PartyProfile,
        tier: DifficultyTier,
        budget: u32,
        window: XpWindow,
        candidates: &[MonsterMetadata],
        combos: &[ComboOption],
    ) -> String {
        let mut prompt = String::new();

        prompt.push_str(&format!(
            "ENCOUNTER: {} \"{}\"\nPARTY: {} characters, level {}\nDIFFICULTY: {}\nXP BUDGET: {} (acceptable total: {} to {})\n\n",
            encounter.id,
            encounter.title,
            party.size,
            party.level,
            tier.display_name(),
            budget,
            window.min,
            window.max,
        ));

        prompt.push_str("AVAILABLE CREATURES (use only these):\n");
        for monster in candidates {
            prompt.push_str(&format!(
                "- {} | {} | CR {} | {} XP | {}\n",
                monster.file,
                monster.name,
                monster.cr,
                monster.xp(),
                monster.combat_role.display_name()
            ));
        }

        if !combos.is_empty() {
            prompt.push_str("\nBALANCED COMBINATIONS ALREADY VERIFIED (prefer one of these):\n");
            for combo in combos {
                prompt.push_str(&format!("- {}\n", combo.description));
            }
        }

        prompt.push_str(r#"
RESPONSE SCHEMA (all listed fields required):
{
  "type": "monsters",
  "encounter_id": "<the encounter uuid above>",
  "monsters": [{"filename": "...", "name": "...", "cr": "1/4", "count": 2, "reasoning": "..."}],
  "totalXP": 0,
  "explanation": "why this line-up fits the encounter"
}"#);

        prompt
    }

    /// Ask for 3-5 theme keywords to narrow a large candidate pool
    pub fn keyword_request(
        &self,
        encounter: &EncounterNode,
        user_request: &str,
        known_keywords: &[String],
    ) -> String {
        let mut prompt = String::new();

        prompt.push_str(&format!(
            "The candidate pool for encounter \"{}\" is too large. Suggest 3 to 5 theme keywords to narrow it.\n\nUSER REQUEST:\n{}\n",
            encounter.title, user_request
        ));

        if !known_keywords.is_empty() {
            prompt.push_str(&format!(
                "\nCHOOSE ONLY FROM THESE KEYWORDS:\n{}\n",
                known_keywords.join(", ")
            ));
        }

        prompt.push_str(r#"
RESPONSE SCHEMA (all listed fields required):
{
  "type": "keywords",
  "keywords": ["keyword1", "keyword2", "keyword3"],
  "reasoning": "why these keywords fit"
}"#);

        prompt
    }

    /// Corrective feedback after a failed structure validation
    pub fn structure_retry(&self, errors: &[String], metrics: &StructureMetrics) -> String {
        let mut prompt = String::new();

        prompt.push_str("Your previous proposal violated these invariants:\n");
        for error in errors {
            prompt.push_str(&format!("- {}\n", error));
        }

        prompt.push_str(&format!(
            "\nCURRENT GRAPH METRICS:\n- nodes: {}\n- edges: {}\n- average out-degree: {:.2}\n- branch points: {}\n- isolated nodes: {}\n",
            metrics.node_count,
            metrics.edge_count,
            metrics.average_out_degree,
            metrics.branch_points,
            metrics.isolated_nodes,
        ));

        prompt.push_str(
            "\nSend a corrected proposal in the same schema that fixes every violation listed above.",
        );
        prompt
    }

    /// Corrective feedback after a budget mismatch, echoing the exact CR
    /// pattern so the generator can redo the arithmetic
    pub fn budget_retry(
        &self,
        chosen: &[(String, String, u32)],
        reported_xp: u32,
        computed_xp: u32,
        window: XpWindow,
    ) -> String {
        let mut prompt = String::new();

        prompt.push_str("Your previous line-up does not satisfy the XP budget.\n\nYOU CHOSE:\n");
        for (name, cr, count) in chosen {
            prompt.push_str(&format!("- {}x {} (CR {})\n", count, name, cr));
        }
        prompt.push_str(&format!(
            "\nYou reported totalXP = {}, but the authoritative total is {}.\nThe total must land between {} and {}.\n\nSend a corrected line-up in the same schema.",
            reported_xp, computed_xp, window.min, window.max
        ));
        prompt
    }

    /// Feedback for a response that could not be parsed at all
    pub fn parse_retry(&self, detail: &str) -> String {
        format!(
            "Your previous response could not be parsed as a proposal object ({}).\nAnswer again with exactly one JSON object matching the requested schema, with no surrounding text.",
            detail
        )
    }
}

impl Default for PromptBuilder {
    fn default() -> Self {
        Self::new()
    }
}

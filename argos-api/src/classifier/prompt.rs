//! Classifier prompt

/// Inspection checklist the model grades against
pub const ULD_INSPECTION_RULES: &str = "\
1. Base: punctures, cracks, bent or missing edge rails, delamination.
2. Side and roof panels: cracks, holes, tears, dents deeper than 2cm.
3. Door and curtain: missing or broken straps, torn curtain, seal damage.
4. Frame and profiles: bent, cracked or broken corner posts and profiles.
5. Nets and fittings: torn nets, missing or damaged locking fittings.
6. Leakage: staining or residue that indicates a leaking load.";

/// Mapping from findings to the traffic-light status
pub const TRAFFIC_LIGHT_LOGIC: &str = "\
- green: no damage, or only cosmetic marks. The ULD is serviceable.
- yellow: minor damage within repair limits (small dents, panel crack under 10cm, \
minor strap wear). Serviceable, flag for repair at the next station.
- red: structural damage (base puncture, crack over 10cm, breach, broken frame, \
leakage). Unserviceable, remove from service.";

/// Build the prompt for one ULD and its findings summary
pub fn build_prompt(uld_id: &str, findings: &str) -> String {
    format!(
        r#"You are ARGOS, an AI assistant acting as a ULD (Unit Load Device) inspector for an air cargo operator.
You will receive a damage report from a local object-detection model. Analyze it against the ULD Inspection Items and the Traffic Light Logic below.

ULD Inspection Items:
{rules}

Traffic Light Logic:
{logic}

Analysis Task:
The ULD ID is: {uld_id}
The local detection model found: "{findings}"

Your Response:
Respond only with a valid JSON object. Do not add any other text, markdown ticks or explanations.
The JSON must have the following structure:
{{
  "uld_id": "{uld_id}",
  "status": "green|yellow|red",
  "damage_category": "string (e.g. 'Panel crack > 10cm' or 'No damage found')",
  "shipping_location": "string (e.g. 'HKG ➜ LAX' or 'Ready at SFO Warehouse')"
}}"#,
        rules = ULD_INSPECTION_RULES,
        logic = TRAFFIC_LIGHT_LOGIC,
        uld_id = uld_id,
        findings = findings,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_embeds_inputs() {
        let prompt = build_prompt("AKE-CPA100", "Found 1 potential issues: breach (confidence: 0.91); ");
        assert!(prompt.contains("The ULD ID is: AKE-CPA100"));
        assert!(prompt.contains("breach (confidence: 0.91)"));
        assert!(prompt.contains("\"uld_id\": \"AKE-CPA100\""));
        assert!(prompt.contains(TRAFFIC_LIGHT_LOGIC));
        assert!(prompt.contains(ULD_INSPECTION_RULES));
    }
}

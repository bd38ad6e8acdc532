//! Long-form pharmacology reference answers served when the completion service is unreachable.

pub struct ReferenceTopic {
    pub name: &'static str,
    pub triggers: &'static [&'static str],
    pub answer: &'static str,
}

pub const GENERAL_REFERENCE: &str = "Thank you for your pharmacovigilance query. I can help with various aspects of drug safety monitoring including:

- Adverse drug reaction assessment and reporting
- Drug interaction evaluation methodologies
- Signal detection and risk assessment
- Regulatory compliance requirements
- Safety monitoring best practices
- Special population considerations
- PSUR and periodic reporting guidance

Please ask specific questions about any of these areas for detailed guidance. For patient-specific situations, always consult with qualified healthcare professionals and follow your institution's protocols.";

/// Evaluated in order; first topic with a matching trigger answers.
pub static REFERENCE_TOPICS: &[ReferenceTopic] = &[
    ReferenceTopic {
        name: "drug_interactions",
        triggers: &["drug interaction", "interaction"],
        answer: "For drug interaction assessment in pharmacovigilance:

1. **Clinical Evaluation**: Review patient's complete medication history, including prescription drugs, OTC medications, and supplements.

2. **Mechanism Assessment**: Identify potential interactions based on:
   - Pharmacokinetic interactions (absorption, distribution, metabolism, excretion)
   - Pharmacodynamic interactions (additive, synergistic, or antagonistic effects)

3. **Risk Stratification**: Consider patient-specific factors:
   - Age and comorbidities
   - Hepatic and renal function
   - Genetic polymorphisms affecting drug metabolism

4. **Documentation**: Use standardized interaction databases (Lexicomp, Micromedex) and document severity levels (contraindicated, major, moderate, minor).

5. **Monitoring**: Establish appropriate monitoring parameters for identified interactions.

Recommended next steps: Consult current drug interaction databases and consider dose adjustments or alternative therapies when clinically significant interactions are identified.",
    },
    ReferenceTopic {
        name: "signal_detection",
        triggers: &["signal detection", "safety signal"],
        answer: "Pharmacovigilance signal detection best practices:

1. **Data Sources**: Monitor multiple data streams:
   - Spontaneous adverse event reports
   - Clinical trial data
   - Electronic health records
   - Literature surveillance
   - Social media monitoring

2. **Statistical Methods**:
   - Proportional Reporting Ratio (PRR)
   - Reporting Odds Ratio (ROR)
   - Information Component (IC)
   - Empirical Bayes Geometric Mean (EBGM)

3. **Signal Validation**: Evaluate biological plausibility, dose-response relationship, temporal association, and consistency across data sources.

4. **Regulatory Compliance**: Follow ICH E2E guidelines and maintain traceability of signal detection activities.

5. **Risk Communication**: Ensure timely communication of validated signals to regulatory authorities and healthcare providers.

Regular review cycles should be established to monitor emerging safety patterns and maintain signal detection effectiveness.",
    },
    ReferenceTopic {
        name: "adr_reporting",
        triggers: &["adr report", "adverse event"],
        answer: "ADR reporting requirements and best practices:

1. **Mandatory Elements**:
   - Patient identifiers (initials, age, gender)
   - Suspect medication details (name, dose, indication)
   - Adverse event description and outcome
   - Reporter information and contact details

2. **Timeline Requirements**:
   - Serious ADRs: Report within 15 days of awareness
   - Non-serious ADRs: Include in periodic reports
   - Follow-up information: Submit within 90 days

3. **Seriousness Criteria** (Any event that):
   - Results in death
   - Is life-threatening
   - Requires hospitalization
   - Results in persistent disability
   - Is a congenital anomaly
   - Requires intervention to prevent permanent damage

4. **Quality Standards**: Ensure reports are complete, accurate, and include sufficient detail for medical assessment.

5. **Regulatory Submission**: Use appropriate channels (FDA MedWatch, EMA EudraVigilance, local authorities).

Maintain comprehensive documentation and follow-up procedures to support regulatory compliance and patient safety.",
    },
    ReferenceTopic {
        name: "elderly_patients",
        triggers: &["elderly", "geriatric"],
        answer: "Special considerations for pharmacovigilance in elderly patients:

1. **Age-Related Changes**: Monitor for altered drug metabolism due to decreased hepatic and renal function, requiring dose adjustments.

2. **Polypharmacy Risks**: Elderly patients often take multiple medications, increasing interaction potential and ADR risk.

3. **Enhanced Monitoring**: Implement more frequent safety assessments for cognitive effects, falls risk, and cardiovascular complications.

4. **Reporting Considerations**: Age-related ADRs may be underreported as symptoms are often attributed to normal aging.

Recommendation: Establish comprehensive medication review protocols and consider lower starting doses with careful titration.",
    },
    ReferenceTopic {
        name: "regulatory_compliance",
        triggers: &["regulatory", "compliance"],
        answer: "Key regulatory compliance requirements for pharmacovigilance:

1. **Global Standards**: Follow ICH E2A-E2F guidelines for safety reporting and risk management.

2. **Regional Requirements**:
   - FDA: MedWatch reporting, REMS programs
   - EMA: EudraVigilance, RMP requirements
   - WHO: Uppsala Monitoring Centre collaboration

3. **Documentation Standards**: Maintain complete audit trails, data integrity, and traceability for all safety activities.

4. **Quality Systems**: Implement robust QMS with regular internal audits and corrective action procedures.

Essential: Stay current with regulatory updates and maintain qualified person responsibilities for safety oversight.",
    },
    ReferenceTopic {
        name: "psur_practices",
        triggers: &["psur", "periodic safety"],
        answer: "PSUR (Periodic Safety Update Report) best practices:

1. **Data Integration**: Compile safety data from all sources including clinical trials, spontaneous reports, and literature.

2. **Benefit-Risk Assessment**: Provide comprehensive evaluation of product's safety profile in context of therapeutic benefit.

3. **Signal Evaluation**: Include assessment of new safety signals and status of ongoing safety investigations.

4. **Regulatory Timelines**: Submit according to established schedules (typically annually for first 2 years, then every 3 years).

Key elements: Executive summary, clinical safety profile, exposure data, and risk minimization measures effectiveness evaluation.",
    },
];

/// The first matching topic, case-insensitive.
pub fn match_topic(query: &str) -> Option<&'static ReferenceTopic> {
    let q = query.to_lowercase();
    REFERENCE_TOPICS
        .iter()
        .find(|t| t.triggers.iter().any(|trigger| q.contains(trigger)))
}

/// Topic answer, or the general overview when nothing matches.
pub fn reference_answer(query: &str) -> &'static str {
    match_topic(query).map_or(GENERAL_REFERENCE, |t| t.answer)
}

use crate::types::WILDCARD_MARKER;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("failed to read schema file {path}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse schema file {path}")]
    Parse {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },
    #[error("duplicate label '{0}' in schema")]
    DuplicateLabel(String),
    #[error("repeating-group template '{0}' has no '{WILDCARD_MARKER}' marker")]
    TemplateWithoutMarker(String),
}

/// One piece of a declarative schema description: either a plain run of
/// labels or a repeating group expanded `count` times (index replaces the
/// wildcard marker, group-major: all templates for index 1, then index 2...).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SchemaSegment {
    Labels(Vec<String>),
    Repeat { templates: Vec<String>, count: usize },
}

/// Declarative description of a label schema. Built once at startup into a
/// `LabelSchema`; keeps the column layout inspectable and testable
/// independently of extraction logic.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchemaSpec {
    pub segments: Vec<SchemaSegment>,
}

impl SchemaSpec {
    pub fn build(&self) -> Result<LabelSchema, SchemaError> {
        let mut labels: Vec<String> = Vec::new();
        for segment in &self.segments {
            match segment {
                SchemaSegment::Labels(run) => {
                    labels.extend(run.iter().cloned());
                }
                SchemaSegment::Repeat { templates, count } => {
                    for template in templates {
                        if !template.contains(WILDCARD_MARKER) {
                            return Err(SchemaError::TemplateWithoutMarker(template.clone()));
                        }
                    }
                    for index in 1..=*count {
                        for template in templates {
                            labels.push(
                                template.replace(WILDCARD_MARKER, &index.to_string()),
                            );
                        }
                    }
                }
            }
        }
        LabelSchema::new(labels)
    }

    pub fn load_from_file(path: &Path) -> Result<Self, SchemaError> {
        let content = std::fs::read_to_string(path).map_err(|source| SchemaError::Io {
            path: path.display().to_string(),
            source,
        })?;
        serde_yaml::from_str(&content).map_err(|source| SchemaError::Parse {
            path: path.display().to_string(),
            source,
        })
    }

    /// The built-in assessment schema: the fixed label set this tool was
    /// written for, including the 26 medication-row repeating group.
    pub fn assessment() -> Self {
        Self {
            segments: vec![
                SchemaSegment::Labels(split_labels(ASSESSMENT_BASE_LABELS)),
                SchemaSegment::Repeat {
                    templates: MEDICATION_ROW_TEMPLATES
                        .iter()
                        .map(|t| (*t).to_string())
                        .collect(),
                    count: MEDICATION_ROW_COUNT,
                },
                SchemaSegment::Labels(split_labels(ASSESSMENT_TAIL_LABELS)),
            ],
        }
    }
}

/// Ordered, unique label identifiers. The sole determinant of output column
/// order; every label appears in every output row. Immutable for a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelSchema {
    labels: Vec<String>,
}

impl LabelSchema {
    pub fn new(labels: Vec<String>) -> Result<Self, SchemaError> {
        let mut seen = std::collections::HashSet::new();
        for label in &labels {
            if !seen.insert(label.as_str()) {
                return Err(SchemaError::DuplicateLabel(label.clone()));
            }
        }
        Ok(Self { labels })
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.labels.iter().map(String::as_str)
    }

    pub fn contains(&self, label: &str) -> bool {
        self.labels.iter().any(|l| l == label)
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

fn split_labels(block: &str) -> Vec<String> {
    block.split_whitespace().map(str::to_string).collect()
}

/// Per-medication-row templates, expanded 26 times (group-major by index).
const MEDICATION_ROW_TEMPLATES: &[&str] = &[
    "ma_drug*", "mad*", "ma_unit*", "ma_route*", "ma_frq*", "p*", "ma_notes*", "notes*",
];

const MEDICATION_ROW_COUNT: usize = 26;

const ASSESSMENT_BASE_LABELS: &str = "
last first dob cin asm_date a_present a_source a_mode caregiver_assist a_goc a_omcg a_cgcomm a_lvstatus a_lvarr a_ed a_sect_comments
b_shortmem b_procmem b_sect_comments c_sect_comments d_pleasure d_anxious d_sad d_sect_comments
e_social e_family e_other e_alone e_stress e_sect_comments
f_mealperf f_mealcap f_hswperf f_hswcap f_fncperf f_fnccap f_medperf f_medcap f_phnperf f_phncap f_stairperf f_staircap
f_shopperf f_shopcap f_transperf f_transcap f_bathing f_hygiene f_dressup f_dresslow f_walk f_loco f_transtoilet f_toiletuse
f_bedmob f_eating f_mode f_exercise f_out f_adlchange f_suffchange f_drove f_stopdrv f_toltrans f_sect_comments
g_bladder g_bowel g_sect_comments
h_hip h_other h_alz h_demen h_stroke h_chd h_copd h_chf h_anx h_bpd h_depr h_schiz h_covid h_cancer h_dm h_sect_comments
i_falls i_noinj i_mininj i_majinj i_dizzi i_gait i_chest i_atp i_ffb i_hallu i_reflux i_const i_diarr i_vomit i_nonsleep i_toosleep
i_dyspnea i_fat i_painfreq i_painint i_paincons i_painbrkt i_paincntrl i_cond i_exp i_health i_smoke i_chew i_drinks i_drinkcut
i_drinkcrit i_drinkguilt i_drinkeye i_drinksoc i_sect_comments
j_weight j_dehyd j_fluidin j_fluidout j_mode j_sect_comments
k_rx k_allergy k_allcat k_allother k_sect_comments
l_bp l_colon l_dental l_eye l_hearing l_influ l_mammo l_pneu l_covid l_inpatient l_er l_phys l_facility l_impmed l_inj l_resp l_wound
l_hhdiab l_gibleed l_heart l_mcis l_chemo l_surg l_uti l_iv l_dvtpe l_pain l_psycho l_other l_unknown l_impmeder l_nausea l_injer
l_resper l_wounder l_cardiac l_hhdiaber l_gibleeder l_otherer l_unknowner l_therapy l_respite l_eolc l_perm l_unsafe l_othernh
l_unknh l_sect_comments
m_family m_commun m_sect_comments
n_food n_shelter n_clothing n_meds n_hvac n_health n_sect_comments
";

const ASSESSMENT_TAIL_LABELS: &str = "
chad_bp chad_copd chad_dm chad_heart chad_hip chad_odem chad_ofrac
fsd_hemi fsd_ms fsd_para fsd_park fsd_pneu
od_d1 od_dd1 od_icd1 od_d2 od_dd2 od_icd2 od_d3 od_dd3 od_icd3 od_d4 od_dd4 od_icd4
sec_age sec_loc sec_120 sec_adl1 sec_adl2 sec_adl3 sf_120 sf_sched sf_alone
";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repeat_segment_expands_in_declaration_order() {
        let spec = SchemaSpec {
            segments: vec![SchemaSegment::Repeat {
                templates: vec!["drug*".to_string(), "dose*".to_string()],
                count: 3,
            }],
        };
        let schema = spec.build().unwrap();
        let labels: Vec<&str> = schema.iter().collect();
        assert_eq!(labels, ["drug1", "dose1", "drug2", "dose2", "drug3", "dose3"]);
    }

    #[test]
    fn duplicate_labels_rejected() {
        let spec = SchemaSpec {
            segments: vec![SchemaSegment::Labels(vec![
                "dob".to_string(),
                "dob".to_string(),
            ])],
        };
        assert!(matches!(
            spec.build(),
            Err(SchemaError::DuplicateLabel(label)) if label == "dob"
        ));
    }

    #[test]
    fn repeat_template_without_marker_rejected() {
        let spec = SchemaSpec {
            segments: vec![SchemaSegment::Repeat {
                templates: vec!["drug".to_string()],
                count: 2,
            }],
        };
        assert!(matches!(
            spec.build(),
            Err(SchemaError::TemplateWithoutMarker(_))
        ));
    }

    #[test]
    fn assessment_schema_builds_with_medication_rows() {
        let schema = SchemaSpec::assessment().build().unwrap();
        assert!(schema.contains("last"));
        assert!(schema.contains("ma_drug1"));
        assert!(schema.contains("notes26"));
        assert!(!schema.contains("ma_drug27"));
        assert!(schema.contains("sf_alone"));
        // base + 26 medication rows of 8 + tail, all unique
        let unique: std::collections::HashSet<&str> = schema.iter().collect();
        assert_eq!(unique.len(), schema.len());
    }

    #[test]
    fn schema_order_is_declaration_order() {
        let schema = SchemaSpec::assessment().build().unwrap();
        let labels: Vec<&str> = schema.iter().collect();
        assert_eq!(labels[0], "last");
        assert_eq!(labels[1], "first");
        let drug1 = labels.iter().position(|l| *l == "ma_drug1").unwrap();
        let drug2 = labels.iter().position(|l| *l == "ma_drug2").unwrap();
        assert!(drug1 < drug2);
        assert_eq!(labels.last(), Some(&"sf_alone"));
    }
}

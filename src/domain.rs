use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::OmicsError;

macro_rules! identifier {
    ($name:ident, $label:literal, $example:literal) => {
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub struct $name(String);

        impl $name {
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = OmicsError;

            fn from_str(value: &str) -> Result<Self, Self::Err> {
                let normalized = value.trim();
                if normalized.is_empty() {
                    return Err(OmicsError::Validation(format!(
                        "{} must be a non-empty string (e.g. \"{}\")",
                        $label, $example
                    )));
                }
                Ok(Self(normalized.to_string()))
            }
        }
    };
}

identifier!(StudyId, "Cancer Study ID", "cellline_ccle_broad");
identifier!(CaseListId, "Case list ID", "cellline_ccle_broad_all");
identifier!(
    GeneticProfileId,
    "Genetic Profile ID",
    "cellline_ccle_broad_log2CNA"
);

impl StudyId {
    /// Case list covering every sample of the study, e.g. `lusc_tcga_all`.
    pub fn all_cases(&self) -> CaseListId {
        CaseListId(format!("{}_all", self.0))
    }

    /// Profile of the given type within the study, e.g. `lusc_tcga_mrna`.
    pub fn profile(&self, data_type: &DataType) -> GeneticProfileId {
        GeneticProfileId(format!("{}_{}", self.0, data_type.as_str()))
    }
}

/// Suffix naming a genetic profile within a TCGA study.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", from = "String")]
pub enum DataType {
    /// Methylation (HM450) beta-values.
    Methylation,
    /// Mutations from whole exome sequencing.
    Mutations,
    /// Putative copy-number calls from GISTIC 2.0.
    CnaPutative,
    /// Relative linear copy-number values.
    Cna,
    /// mRNA z-scores (microarray).
    ExpressionZscore,
    /// mRNA expression (microarray).
    Expression,
    /// mRNA z-scores (RNA Seq V2 RSEM).
    RnaSeqZscore,
    /// mRNA expression (RNA Seq V2 RSEM).
    RnaSeq,
    /// Protein expression z-scores (RPPA).
    RppaZscore,
    /// Protein expression (RPPA).
    Rppa,
    Custom(String),
}

impl DataType {
    pub fn as_str(&self) -> &str {
        match self {
            DataType::Methylation => "methylation_hm450",
            DataType::Mutations => "mutations",
            DataType::CnaPutative => "gistic",
            DataType::Cna => "linear_CNA",
            DataType::ExpressionZscore => "mrna_median_Zscores",
            DataType::Expression => "mrna",
            DataType::RnaSeqZscore => "rna_seq_v2_mrna_median_Zscores",
            DataType::RnaSeq => "rna_seq_v2_mrna",
            DataType::RppaZscore => "rppa_Zscores",
            DataType::Rppa => "rppa",
            DataType::Custom(value) => value,
        }
    }

    pub fn expression_zscores(use_rna_seq: bool) -> Self {
        if use_rna_seq {
            DataType::RnaSeqZscore
        } else {
            DataType::ExpressionZscore
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl From<String> for DataType {
    fn from(value: String) -> Self {
        match value.as_str() {
            "methylation_hm450" => DataType::Methylation,
            "mutations" => DataType::Mutations,
            "gistic" => DataType::CnaPutative,
            "linear_CNA" => DataType::Cna,
            "mrna_median_Zscores" => DataType::ExpressionZscore,
            "mrna" => DataType::Expression,
            "rna_seq_v2_mrna_median_Zscores" => DataType::RnaSeqZscore,
            "rna_seq_v2_mrna" => DataType::RnaSeq,
            "rppa_Zscores" => DataType::RppaZscore,
            "rppa" => DataType::Rppa,
            _ => DataType::Custom(value),
        }
    }
}

impl From<DataType> for String {
    fn from(value: DataType) -> Self {
        value.as_str().to_string()
    }
}

impl FromStr for DataType {
    type Err = OmicsError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(OmicsError::Validation(
                "data type must be a non-empty string (e.g. \"mutations\")".to_string(),
            ));
        }
        Ok(DataType::from(trimmed.to_string()))
    }
}

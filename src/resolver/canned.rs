//! Canned replies for the demo assistant

use super::{Reply, ResponseResolver};
use crate::store::{Attachment, ContentBlock};
use async_trait::async_trait;
use serde::Serialize;
use std::time::Duration;

/// Emulated inference latency
pub const DEFAULT_LATENCY: Duration = Duration::from_millis(1500);

/// What an utterance is about, as far as the canned dispatcher can tell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Topic {
    Inflation,
    QuarterlyReport,
    General,
}

/// Classify an utterance.
///
/// First match wins, in this order: "inflation", then "rapport". Matching is
/// a case-insensitive substring test.
pub fn classify(utterance: &str) -> Topic {
    let lowered = utterance.to_lowercase();
    if lowered.contains("inflation") {
        Topic::Inflation
    } else if lowered.contains("rapport") {
        Topic::QuarterlyReport
    } else {
        Topic::General
    }
}

/// Map an utterance to its reply. Pure.
pub fn resolve(utterance: &str) -> Reply {
    match classify(utterance) {
        Topic::Inflation => inflation_reply(),
        Topic::QuarterlyReport => quarterly_report_reply(),
        Topic::General => general_reply(),
    }
}

fn inflation_reply() -> Reply {
    Reply {
        topic: Topic::Inflation,
        content: vec![
            ContentBlock::text(
                "Le taux d'inflation moyen dans l'UEMOA s'est établi à 3,7% en 2023 contre 7,4% \
                 en 2022. Cette baisse est principalement due à l'atténuation des tensions sur les \
                 prix des produits alimentaires et énergétiques.",
            ),
            ContentBlock::figure(
                "Évolution de l'inflation par pays",
                "Graphique d'inflation",
            ),
        ],
        attachments: vec![Attachment::chart("inflation_data")],
    }
}

fn quarterly_report_reply() -> Reply {
    Reply {
        topic: Topic::QuarterlyReport,
        content: vec![
            ContentBlock::text(
                "Voici un extrait du dernier rapport sur la situation économique de l'UEMOA :",
            ),
            ContentBlock::heading("Rapport trimestriel T1 2023"),
            ContentBlock::section(
                "1. Contexte macroéconomique",
                "L'activité économique dans l'UEMOA a maintenu sa dynamique de croissance au \
                 premier trimestre 2023, avec un taux de croissance estimé à 5,2%, contre 5,0% au \
                 trimestre précédent.",
            ),
            ContentBlock::section(
                "2. Évolution des prix",
                "Le taux d'inflation s'est établi à 5,5%, poursuivant sa tendance baissière \
                 entamée depuis le dernier trimestre 2022 (5,9%).",
            ),
        ],
        attachments: vec![Attachment::document("rapport_t1_2023")],
    }
}

fn general_reply() -> Reply {
    Reply {
        topic: Topic::General,
        content: vec![ContentBlock::text(
            "Je peux vous aider à analyser des données économiques, générer des rapports, ou \
             effectuer des recherches sur des sujets liés à la BCEAO et l'UEMOA. Que souhaitez-vous \
             faire ?",
        )],
        attachments: vec![],
    }
}

/// Resolver that answers from the canned table after a fixed delay
pub struct CannedResolver {
    latency: Duration,
}

impl CannedResolver {
    pub fn new(latency: Duration) -> Self {
        Self { latency }
    }
}

impl Default for CannedResolver {
    fn default() -> Self {
        Self::new(DEFAULT_LATENCY)
    }
}

#[async_trait]
impl ResponseResolver for CannedResolver {
    async fn reply(&self, utterance: &str) -> Reply {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        resolve(utterance)
    }

    fn name(&self) -> &'static str {
        "canned"
    }
}

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// One row of chatbot usage data for a given date and region.
///
/// Field names map to the cleaned CSV header names.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    #[serde(rename = "data")]
    pub date: NaiveDate,
    #[serde(rename = "local")]
    pub region: String,
    pub feedback: Feedback,
    #[serde(rename = "respostas")]
    pub responses: u64,
    #[serde(rename = "media_conversas_por_dia")]
    pub avg_conversations_per_day: f64,
    #[serde(rename = "total_interacoes")]
    pub total_interactions: u64,
    /// Average chat duration in minutes.
    #[serde(rename = "tempo_medio_chat")]
    pub avg_chat_duration: f64,
    #[serde(rename = "avaliacao_conversa")]
    pub conversation_rating: f64,
    #[serde(rename = "numero_total_conversas")]
    pub total_conversations: u64,
    #[serde(rename = "tempo_estimado_conversa")]
    pub estimated_conversation_minutes: f64,
    #[serde(rename = "media_mensagens_por_conversa")]
    pub avg_messages_per_conversation: f64,
    #[serde(rename = "demanda_diaria")]
    pub daily_demand: u64,
    #[serde(rename = "demanda_semanal")]
    pub weekly_demand: u64,
    #[serde(rename = "acuracia_respostas")]
    pub response_accuracy: f64,
    /// Whitespace-joined list of frequently used words.
    #[serde(rename = "palavras_mais_usadas")]
    pub top_words: String,
}

impl Record {
    /// Cleaned CSV column names every source file must carry.
    pub const REQUIRED_COLUMNS: [&'static str; 15] = [
        "data",
        "local",
        "feedback",
        "respostas",
        "media_conversas_por_dia",
        "total_interacoes",
        "tempo_medio_chat",
        "avaliacao_conversa",
        "numero_total_conversas",
        "tempo_estimado_conversa",
        "media_mensagens_por_conversa",
        "demanda_diaria",
        "demanda_semanal",
        "acuracia_respostas",
        "palavras_mais_usadas",
    ];

    /// Float metrics paired with their column names, for load-time validation.
    pub fn float_metrics(&self) -> [(&'static str, f64); 6] {
        [
            ("media_conversas_por_dia", self.avg_conversations_per_day),
            ("tempo_medio_chat", self.avg_chat_duration),
            ("avaliacao_conversa", self.conversation_rating),
            ("tempo_estimado_conversa", self.estimated_conversation_minutes),
            ("media_mensagens_por_conversa", self.avg_messages_per_conversation),
            ("acuracia_respostas", self.response_accuracy),
        ]
    }

    pub fn words(&self) -> impl Iterator<Item = &str> {
        self.top_words.split_whitespace()
    }
}

/// Conversation feedback label.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Feedback {
    Positivo,
    Neutro,
    Negativo,
    /// Label outside the known vocabulary.
    Other(String),
}

impl Feedback {
    pub const KNOWN: [Feedback; 3] = [Feedback::Positivo, Feedback::Neutro, Feedback::Negativo];

    pub fn as_str(&self) -> &str {
        match self {
            Feedback::Positivo => "positivo",
            Feedback::Neutro => "neutro",
            Feedback::Negativo => "negativo",
            Feedback::Other(label) => label,
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, Feedback::Other(_))
    }
}

impl From<String> for Feedback {
    fn from(label: String) -> Self {
        match label.trim().to_lowercase().as_str() {
            "positivo" => Feedback::Positivo,
            "neutro" => Feedback::Neutro,
            "negativo" => Feedback::Negativo,
            _ => Feedback::Other(label),
        }
    }
}

impl From<&str> for Feedback {
    fn from(label: &str) -> Self {
        Feedback::from(label.to_string())
    }
}

impl From<Feedback> for String {
    fn from(feedback: Feedback) -> Self {
        feedback.as_str().to_string()
    }
}

impl fmt::Display for Feedback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Region labels matching the `properties.name` of the Brazil states GeoJSON.
pub const BRAZIL_STATES: [&str; 27] = [
    "Acre",
    "Alagoas",
    "Amapá",
    "Amazonas",
    "Bahia",
    "Ceará",
    "Distrito Federal",
    "Espírito Santo",
    "Goiás",
    "Maranhão",
    "Mato Grosso",
    "Mato Grosso do Sul",
    "Minas Gerais",
    "Pará",
    "Paraíba",
    "Paraná",
    "Pernambuco",
    "Piauí",
    "Rio de Janeiro",
    "Rio Grande do Norte",
    "Rio Grande do Sul",
    "Rondônia",
    "Roraima",
    "Santa Catarina",
    "São Paulo",
    "Sergipe",
    "Tocantins",
];

/// User-selected date range plus optional region and feedback inclusion sets.
///
/// Bounds are inclusive. An empty set imposes no constraint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterCriteria {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    #[serde(default)]
    pub regions: BTreeSet<String>,
    #[serde(default)]
    pub feedback: BTreeSet<Feedback>,
}

impl FilterCriteria {
    /// Date-only criteria.
    pub fn between(start_date: NaiveDate, end_date: NaiveDate) -> Self {
        Self {
            start_date,
            end_date,
            regions: BTreeSet::new(),
            feedback: BTreeSet::new(),
        }
    }

    pub fn with_regions<I, S>(mut self, regions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.regions = regions.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_feedback<I>(mut self, feedback: I) -> Self
    where
        I: IntoIterator<Item = Feedback>,
    {
        self.feedback = feedback.into_iter().collect();
        self
    }

    /// Reject ranges whose start falls after their end.
    pub fn validate(&self) -> crate::error::Result<()> {
        if self.start_date > self.end_date {
            return Err(crate::error::DashboardError::InvalidRange {
                start: self.start_date,
                end: self.end_date,
            });
        }
        Ok(())
    }

    /// Whether a record satisfies every active predicate.
    pub fn matches(&self, record: &Record) -> bool {
        record.date >= self.start_date
            && record.date <= self.end_date
            && (self.regions.is_empty() || self.regions.contains(&record.region))
            && (self.feedback.is_empty() || self.feedback.contains(&record.feedback))
    }
}

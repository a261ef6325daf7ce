//! VARK learning-style classifier.
//!
//! A fixed questionnaire of 16 forced-choice questions, one option per category.
//! Answers are tallied per category and the dominant style is picked by a
//! left-to-right fold over [`VarkCategory::ALL`] with strict `>` comparisons,
//! so the earliest category among equal maxima wins.

use crate::error::{PalaceError, PalaceResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// The four VARK categories, in declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VarkCategory {
    Visual,
    Auditory,
    Reading,
    Kinesthetic,
}

impl VarkCategory {
    /// Declaration order; also the tie-break order.
    pub const ALL: [VarkCategory; 4] = [
        VarkCategory::Visual,
        VarkCategory::Auditory,
        VarkCategory::Reading,
        VarkCategory::Kinesthetic,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Visual => "visual",
            Self::Auditory => "auditory",
            Self::Reading => "reading",
            Self::Kinesthetic => "kinesthetic",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Visual => "Visual",
            Self::Auditory => "Auditivo",
            Self::Reading => "Lectura/Escritura",
            Self::Kinesthetic => "Kinestésico",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Self::Visual => "Aprendes mejor con imágenes, diagramas, mapas mentales y representaciones visuales.",
            Self::Auditory => "Aprendes mejor escuchando explicaciones, discusiones y contenido de audio.",
            Self::Reading => "Aprendes mejor leyendo textos, tomando notas y escribiendo resúmenes.",
            Self::Kinesthetic => "Aprendes mejor practicando, experimentando y con actividades hands-on.",
        }
    }
}

impl fmt::Display for VarkCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VarkCategory {
    type Err = PalaceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "visual" => Ok(Self::Visual),
            "auditory" => Ok(Self::Auditory),
            "reading" => Ok(Self::Reading),
            "kinesthetic" => Ok(Self::Kinesthetic),
            _ => Err(PalaceError::InvalidCategory(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct QuestionOption {
    pub text: &'static str,
    #[serde(rename = "type")]
    pub category: VarkCategory,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Question {
    pub id: u32,
    pub text: &'static str,
    pub options: [QuestionOption; 4],
}

impl Question {
    /// Every question offers exactly one option per category.
    pub fn is_well_formed(&self) -> bool {
        VarkCategory::ALL
            .iter()
            .all(|c| self.options.iter().filter(|o| o.category == *c).count() == 1)
    }
}

const fn q(
    id: u32,
    text: &'static str,
    visual: &'static str,
    auditory: &'static str,
    reading: &'static str,
    kinesthetic: &'static str,
) -> Question {
    Question {
        id,
        text,
        options: [
            QuestionOption { text: visual, category: VarkCategory::Visual },
            QuestionOption { text: auditory, category: VarkCategory::Auditory },
            QuestionOption { text: reading, category: VarkCategory::Reading },
            QuestionOption { text: kinesthetic, category: VarkCategory::Kinesthetic },
        ],
    }
}

pub static QUESTIONNAIRE: [Question; 16] = [
    q(1, "Cuando estás aprendiendo algo nuevo, prefieres:",
        "Ver diagramas, gráficos o videos",
        "Escuchar explicaciones o podcasts",
        "Leer instrucciones escritas",
        "Practicar y experimentar directamente"),
    q(2, "Para recordar un número de teléfono, tú:",
        "Visualizas los números en tu mente",
        "Lo repites en voz alta varias veces",
        "Lo escribes varias veces",
        "Marcas el número en el aire con tu dedo"),
    q(3, "En una clase, aprendes mejor cuando:",
        "El profesor usa presentaciones visuales",
        "El profesor explica verbalmente",
        "Puedes tomar notas detalladas",
        "Hay actividades prácticas o laboratorios"),
    q(4, "Cuando das direcciones a alguien, prefieres:",
        "Dibujar un mapa o usar gestos",
        "Explicar verbalmente paso a paso",
        "Escribir las instrucciones",
        "Acompañar a la persona o simular el recorrido"),
    q(5, "Cuando estudias para un examen, prefieres:",
        "Hacer mapas mentales o esquemas coloridos",
        "Grabarte explicando el tema y escucharlo",
        "Releer tus notas y el libro de texto",
        "Hacer ejercicios prácticos y casos"),
    q(6, "Tu forma favorita de entretenimiento es:",
        "Ver películas o fotografía",
        "Escuchar música o podcasts",
        "Leer libros o artículos",
        "Hacer deportes o manualidades"),
    q(7, "Cuando armas un mueble nuevo, tú:",
        "Miras las imágenes del manual",
        "Prefieres que alguien te explique cómo hacerlo",
        "Lees las instrucciones paso a paso",
        "Empiezas a armarlo y vas probando"),
    q(8, "Recuerdas mejor a las personas por:",
        "Su cara y apariencia",
        "Su voz y lo que dijeron",
        "Su nombre escrito",
        "Lo que hicieron juntos"),
    q(9, "En una reunión de trabajo, prefieres:",
        "Presentaciones con gráficos y diagramas",
        "Discusiones verbales abiertas",
        "Documentos escritos para revisar",
        "Ejercicios de role-play o simulaciones"),
    q(10, "Cuando tienes un problema, lo resuelves:",
        "Visualizando posibles soluciones",
        "Hablándolo con alguien",
        "Escribiendo pros y contras",
        "Probando diferentes enfoques"),
    q(11, "Tu espacio de estudio ideal tiene:",
        "Buena iluminación y organización visual",
        "Música de fondo o ambiente tranquilo",
        "Muchos libros y materiales de lectura",
        "Espacio para moverte y materiales táctiles"),
    q(12, "Cuando cocinas una receta nueva, prefieres:",
        "Ver un video de cómo prepararla",
        "Que alguien te guíe verbalmente",
        "Seguir la receta escrita paso a paso",
        "Improvisar y probar mientras cocinas"),
    q(13, "Para concentrarte mejor, necesitas:",
        "Un ambiente visualmente ordenado",
        "Silencio o música específica",
        "Tener todo escrito y organizado",
        "Poder moverte o hacer pausas activas"),
    q(14, "Aprendes un idioma nuevo mejor:",
        "Viendo películas con subtítulos",
        "Escuchando conversaciones y canciones",
        "Leyendo textos y estudiando gramática",
        "Practicando conversaciones reales"),
    q(15, "En tu tiempo libre, disfrutas más:",
        "Visitar museos o galerías",
        "Ir a conciertos o charlas",
        "Leer o escribir",
        "Hacer actividades al aire libre"),
    q(16, "Cuando explicas algo a otros, usas:",
        "Dibujos, esquemas o gestos descriptivos",
        "Explicaciones verbales detalladas",
        "Ejemplos escritos o referencias",
        "Demostraciones prácticas"),
];

pub fn total_questions() -> usize {
    QUESTIONNAIRE.len()
}

/// Question index (0-based) -> chosen category. At most one answer per question.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AnswerSet {
    answers: BTreeMap<usize, VarkCategory>,
}

impl AnswerSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record (or replace) the answer for a question of a questionnaire with `total` questions.
    pub fn record(&mut self, index: usize, category: VarkCategory, total: usize) -> PalaceResult<()> {
        if index >= total {
            return Err(PalaceError::QuestionOutOfRange { index, total });
        }
        self.answers.insert(index, category);
        Ok(())
    }

    /// Build from raw string tags (as posted by the front end).
    ///
    /// With `strict`, the first unknown tag fails with `InvalidCategory`. Otherwise
    /// unknown tags are dropped with a warning and the question counts as unanswered.
    pub fn from_tags<'a, I>(tags: I, total: usize, strict: bool) -> PalaceResult<Self>
    where
        I: IntoIterator<Item = (usize, &'a str)>,
    {
        let mut set = Self::new();
        for (index, tag) in tags {
            match tag.parse::<VarkCategory>() {
                Ok(category) => set.record(index, category, total)?,
                Err(e) if strict => return Err(e),
                Err(_) => {
                    tracing::warn!(target: "palace::vark", index, tag, "Ignoring unknown category tag");
                }
            }
        }
        Ok(set)
    }

    pub fn get(&self, index: usize) -> Option<VarkCategory> {
        self.answers.get(&index).copied()
    }

    pub fn len(&self) -> usize {
        self.answers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.answers.is_empty()
    }

    pub fn is_complete(&self, total: usize) -> bool {
        (0..total).all(|i| self.answers.contains_key(&i))
    }

    /// Answered share of the questionnaire, 0.0..=100.0.
    pub fn progress_percent(&self, total: usize) -> f32 {
        if total == 0 {
            return 0.0;
        }
        self.answers.len() as f32 / total as f32 * 100.0
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, VarkCategory)> + '_ {
        self.answers.iter().map(|(i, c)| (*i, *c))
    }

    /// Fails with `IncompleteAnswers` unless every question has an answer.
    pub fn ensure_complete(&self, total: usize) -> PalaceResult<()> {
        if self.is_complete(total) {
            Ok(())
        } else {
            Err(PalaceError::IncompleteAnswers {
                answered: (0..total).filter(|i| self.answers.contains_key(i)).count(),
                required: total,
            })
        }
    }
}

/// Per-category counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreTally {
    pub visual: u32,
    pub auditory: u32,
    pub reading: u32,
    pub kinesthetic: u32,
}

impl ScoreTally {
    pub fn get(&self, category: VarkCategory) -> u32 {
        match category {
            VarkCategory::Visual => self.visual,
            VarkCategory::Auditory => self.auditory,
            VarkCategory::Reading => self.reading,
            VarkCategory::Kinesthetic => self.kinesthetic,
        }
    }

    fn bump(&mut self, category: VarkCategory) {
        match category {
            VarkCategory::Visual => self.visual += 1,
            VarkCategory::Auditory => self.auditory += 1,
            VarkCategory::Reading => self.reading += 1,
            VarkCategory::Kinesthetic => self.kinesthetic += 1,
        }
    }

    pub fn total(&self) -> u32 {
        VarkCategory::ALL.iter().map(|c| self.get(*c)).sum()
    }

    /// Earliest category among the highest counts.
    pub fn dominant(&self) -> VarkCategory {
        VarkCategory::ALL[1..]
            .iter()
            .fold(VarkCategory::ALL[0], |best, c| {
                if self.get(*c) > self.get(best) {
                    *c
                } else {
                    best
                }
            })
    }

    /// Category share of `total_questions`, 0.0..=100.0.
    pub fn percent(&self, category: VarkCategory, total_questions: usize) -> f32 {
        if total_questions == 0 {
            return 0.0;
        }
        self.get(category) as f32 / total_questions as f32 * 100.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VarkResult {
    pub scores: ScoreTally,
    pub dominant: VarkCategory,
}

/// Tally `answers` and pick the dominant category. Pure; accepts incomplete sets.
/// `_total_questions` bounds nothing here; completeness is checked by the caller
/// through [`AnswerSet::ensure_complete`].
pub fn score(answers: &AnswerSet, _total_questions: usize) -> VarkResult {
    let mut scores = ScoreTally::default();
    for (_, category) in answers.iter() {
        scores.bump(category);
    }
    VarkResult {
        dominant: scores.dominant(),
        scores,
    }
}

/// Score a set that must be complete.
pub fn score_complete(answers: &AnswerSet, total_questions: usize) -> PalaceResult<VarkResult> {
    answers.ensure_complete(total_questions)?;
    Ok(score(answers, total_questions))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set_of(categories: &[VarkCategory]) -> AnswerSet {
        let mut set = AnswerSet::new();
        for (i, c) in categories.iter().enumerate() {
            set.record(i, *c, categories.len()).unwrap();
        }
        set
    }

    #[test]
    fn questionnaire_is_well_formed() {
        assert_eq!(QUESTIONNAIRE.len(), 16);
        for (i, question) in QUESTIONNAIRE.iter().enumerate() {
            assert_eq!(question.id as usize, i + 1);
            assert!(question.is_well_formed(), "question {} malformed", question.id);
        }
    }

    #[test]
    fn tie_goes_to_earliest_category() {
        use VarkCategory::*;
        let result = score(&set_of(&[Visual, Visual, Auditory, Auditory, Reading, Kinesthetic]), 6);
        assert_eq!(result.scores.visual, 2);
        assert_eq!(result.scores.auditory, 2);
        assert_eq!(result.dominant, Visual);

        let result = score(&set_of(&[Kinesthetic, Reading]), 2);
        assert_eq!(result.dominant, Reading);
    }

    #[test]
    fn empty_set_defaults_to_visual() {
        let result = score(&AnswerSet::new(), 16);
        assert_eq!(result.scores.total(), 0);
        assert_eq!(result.dominant, VarkCategory::Visual);
    }

    #[test]
    fn answering_twice_replaces_previous_answer() {
        let mut set = AnswerSet::new();
        set.record(0, VarkCategory::Visual, 16).unwrap();
        set.record(0, VarkCategory::Kinesthetic, 16).unwrap();
        assert_eq!(set.len(), 1);
        assert_eq!(score(&set, 16).scores.kinesthetic, 1);
    }

    #[test]
    fn out_of_range_index_is_rejected() {
        let mut set = AnswerSet::new();
        let err = set.record(16, VarkCategory::Visual, 16).unwrap_err();
        assert!(matches!(err, PalaceError::QuestionOutOfRange { index: 16, total: 16 }));
    }

    #[test]
    fn unknown_tags_fail_in_strict_mode_and_drop_otherwise() {
        let tags = vec![(0, "visual"), (1, "olfactory"), (2, "reading")];
        let err = AnswerSet::from_tags(tags.clone(), 16, true).unwrap_err();
        assert!(matches!(err, PalaceError::InvalidCategory(ref t) if t == "olfactory"));

        let lenient = AnswerSet::from_tags(tags, 16, false).unwrap();
        assert_eq!(lenient.len(), 2);
        assert_eq!(lenient.get(1), None);
    }

    #[test]
    fn progress_percent_tracks_answered_share() {
        let mut set = AnswerSet::new();
        for i in 0..4 {
            set.record(i, VarkCategory::Reading, 16).unwrap();
        }
        assert!((set.progress_percent(16) - 25.0).abs() < f32::EPSILON);
        assert!((score(&set, 16).scores.percent(VarkCategory::Reading, 16) - 25.0).abs() < f32::EPSILON);
    }

    #[test]
    fn category_parsing_is_case_insensitive() {
        assert_eq!("Kinesthetic".parse::<VarkCategory>().unwrap(), VarkCategory::Kinesthetic);
        assert_eq!(VarkCategory::Reading.label(), "Lectura/Escritura");
    }
}

// src/services/course_matcher.rs

// Respostas determinísticas sobre o catálogo de cursos.
// Quando há resposta aqui, a IA não é chamada.

use std::{path::Path, sync::LazyLock};

use regex::Regex;

use crate::common::text::{normalize, words};

const MIN_WORD_CHARS: usize = 4;

// "curso(s)" aparece em quase todo pedido e não identifica nenhum curso
const IGNORED_WORDS: [&str; 2] = ["curso", "cursos"];

pub const NO_MATCH_REPLY: &str = "No tenemos un curso relacionado con tu consulta.";

// Aplicados sobre o texto já normalizado (sem acentos, minúsculo)
static LIST_REQUESTS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"\blista(d|t)o\b",
        r"catalogo",
        r"todos\s+los\s+cursos",
        r"ver\s+(los\s+)?cursos",
        r"cuales\s+son\s+los\s+cursos",
        r"que\s+cursos\s+tienen",
        r"dame\s+los\s+cursos",
        r"mostrar\s+(los\s+)?cursos",
    ]
    .iter()
    .map(|p| Regex::new(p).unwrap())
    .collect()
});

#[derive(Debug, Clone, Default)]
pub struct CourseCatalog {
    courses: Vec<Course>,
}

#[derive(Debug, Clone)]
struct Course {
    name: String,
    normalized: String,
}

impl CourseCatalog {
    /// Um curso por linha. Linhas vazias e `#comentários` são ignorados.
    pub fn from_text(text: &str) -> Self {
        let courses = text
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with('#'))
            .map(|name| Course {
                name: name.to_string(),
                normalized: normalize(name),
            })
            .collect();
        Self { courses }
    }

    /// Arquivo ausente não derruba o servidor: o catálogo fica vazio e tudo vai para a IA.
    pub async fn load(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        match tokio::fs::read_to_string(path).await {
            Ok(text) => {
                let catalog = Self::from_text(&text);
                tracing::info!("📚 {} cursos carregados de {}", catalog.len(), path.display());
                catalog
            }
            Err(e) => {
                tracing::warn!("Catálogo de cursos indisponível ({}): {}", path.display(), e);
                Self::default()
            }
        }
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.courses.iter().map(|c| c.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.courses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.courses.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum CourseAnswer {
    /// Pedido explícito da lista completa.
    Listing(Vec<String>),
    Single(String),
    Several(Vec<String>),
    NoMatch,
}

impl CourseAnswer {
    /// Texto para o cliente. `None` quando não há o que dizer (segue para a IA).
    pub fn reply(&self) -> Option<String> {
        match self {
            CourseAnswer::Listing(names) if names.is_empty() => {
                Some("Por el momento no tenemos cursos disponibles.".to_string())
            }
            CourseAnswer::Listing(names) => {
                Some(format!("Estos son los cursos disponibles:\n- {}", names.join("\n- ")))
            }
            CourseAnswer::Single(name) => Some(format!("¡Sí! Tenemos el curso \"{}\".", name)),
            CourseAnswer::Several(names) => {
                Some(format!("Cursos relacionados disponibles:\n- {}", names.join("\n- ")))
            }
            CourseAnswer::NoMatch => None,
        }
    }
}

pub fn is_list_request(message: &str) -> bool {
    let normalized = normalize(message);
    LIST_REQUESTS.iter().any(|re| re.is_match(&normalized))
}

pub fn answer(catalog: &CourseCatalog, message: &str) -> CourseAnswer {
    if is_list_request(message) {
        return CourseAnswer::Listing(catalog.names().map(str::to_string).collect());
    }

    let candidates: Vec<String> = words(message)
        .into_iter()
        .filter(|w| w.chars().count() >= MIN_WORD_CHARS && !IGNORED_WORDS.contains(&w.as_str()))
        .collect();

    if candidates.is_empty() {
        return CourseAnswer::NoMatch;
    }

    let mut matches: Vec<String> = catalog
        .courses
        .iter()
        .filter(|course| {
            candidates
                .iter()
                .any(|w| course.normalized.contains(w.as_str()) || w.contains(course.normalized.as_str()))
        })
        .map(|course| course.name.clone())
        .collect();

    match matches.len() {
        0 => CourseAnswer::NoMatch,
        1 => CourseAnswer::Single(matches.remove(0)),
        _ => CourseAnswer::Several(matches),
    }
}

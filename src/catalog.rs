//! Map asset catalog
//!
//! This module loads quiz maps from the asset directory tree. A map is a
//! named directory with a `questions/` and an `answers/` subdirectory of
//! image files. Question file names carry the data the quiz needs: a
//! leading area number grouping consecutive questions under one answer
//! sheet, and a trailing label that is the call-out players must answer
//! with. Answer-sheet file names carry the area number only.
//!
//! Directory listings are sorted so question order is deterministic across
//! platforms and test runs.

use std::path::{Path, PathBuf};

use heck::ToTitleCase;
use itertools::Itertools;
use thiserror::Error;

/// Errors produced while loading maps from the catalog
#[derive(Debug, Error)]
pub enum Error {
    /// The requested map has no usable question or answer assets
    #[error("map \"{0}\" not found")]
    MapNotFound(String),
    /// The catalog root itself could not be listed
    #[error("could not list maps: {0}")]
    Io(#[from] std::io::Error),
    /// The catalog root contains no map directories at all
    #[error("no maps are installed")]
    NoMaps,
}

/// A per-asset naming problem, logged and skipped during map loading
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AssetParseError {
    /// The file name is missing or not valid unicode
    #[error("asset \"{0}\" has an unreadable file name")]
    UnreadableName(String),
    /// The file name has no extension segment
    #[error("asset \"{0}\" has no file extension")]
    MissingExtension(String),
    /// The file name does not start with an area number
    #[error("asset \"{0}\" has no leading area number")]
    MissingArea(String),
    /// The leading digit run does not fit an area number
    #[error("asset \"{0}\" has an unusable area number")]
    InvalidArea(String),
    /// Nothing remains after the area number to use as a call-out
    #[error("asset \"{0}\" has no call-out label")]
    MissingLabel(String),
}

/// One question image reference with its derived quiz attributes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionAsset {
    path: PathBuf,
    area: u32,
    call_out: String,
}

impl QuestionAsset {
    /// Parses a question asset from its file path
    ///
    /// The file name must look like `<area>-<label>.<ext>`; the label is
    /// lowercased and every hyphen or underscore becomes a space to form
    /// the call-out.
    ///
    /// # Errors
    ///
    /// Returns an [`AssetParseError`] describing which part of the name
    /// was missing or unusable.
    pub fn parse(path: PathBuf) -> Result<Self, AssetParseError> {
        let (area, label) = split_identifier(&path)?;
        if label.is_empty() {
            return Err(AssetParseError::MissingLabel(display_name_of(&path)));
        }
        let call_out = label.to_lowercase().replace(['-', '_'], " ");
        Ok(Self {
            path,
            area,
            call_out,
        })
    }

    /// The image file path, handed to the chat layer for publishing
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The area this question belongs to
    pub fn area(&self) -> u32 {
        self.area
    }

    /// The canonical answer for this question
    pub fn call_out(&self) -> &str {
        &self.call_out
    }
}

/// One answer-sheet image reference covering a whole area
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnswerKeyAsset {
    path: PathBuf,
    area: u32,
}

impl AnswerKeyAsset {
    /// Parses an answer-sheet asset from its file path
    ///
    /// Only the leading area number is required; any trailing label is
    /// ignored.
    ///
    /// # Errors
    ///
    /// Returns an [`AssetParseError`] if the area number is missing or
    /// unusable.
    pub fn parse(path: PathBuf) -> Result<Self, AssetParseError> {
        let (area, _) = split_identifier(&path)?;
        Ok(Self { path, area })
    }

    /// The image file path
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The area this answer sheet covers
    pub fn area(&self) -> u32 {
        self.area
    }
}

/// Splits an asset file name into its area number and raw label
fn split_identifier(path: &Path) -> Result<(u32, &str), AssetParseError> {
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| AssetParseError::UnreadableName(display_name_of(path)))?;
    let (stem, _extension) = name
        .rsplit_once('.')
        .ok_or_else(|| AssetParseError::MissingExtension(name.to_owned()))?;

    let digits = stem
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(stem.len());
    if digits == 0 {
        return Err(AssetParseError::MissingArea(name.to_owned()));
    }
    let area = stem[..digits]
        .parse()
        .map_err(|_| AssetParseError::InvalidArea(name.to_owned()))?;

    let label = stem[digits..].trim_matches(|c: char| matches!(c, '-' | '_' | ' '));
    Ok((area, label))
}

fn display_name_of(path: &Path) -> String {
    path.display().to_string()
}

/// A loaded quiz map: ordered questions plus the area answer sheets
///
/// Immutable once loaded; every quiz start loads the map fresh from disk.
#[derive(Debug, Clone)]
pub struct Map {
    name: String,
    questions: Vec<QuestionAsset>,
    answer_keys: Vec<AnswerKeyAsset>,
}

impl Map {
    /// Builds a map from raw file listings
    ///
    /// Assets whose names cannot be parsed are logged and skipped rather
    /// than failing the load. Listings are expected to be pre-sorted by
    /// the caller; [`Catalog::load_map`] sorts its directory listings.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MapNotFound`] if no question asset survives
    /// parsing, since a quiz cannot start without questions.
    pub fn from_listing(
        name: &str,
        question_files: Vec<PathBuf>,
        answer_files: Vec<PathBuf>,
    ) -> Result<Self, Error> {
        let questions = question_files
            .into_iter()
            .filter_map(|path| match QuestionAsset::parse(path) {
                Ok(asset) => Some(asset),
                Err(error) => {
                    log::warn!("skipping question asset of map \"{name}\": {error}");
                    None
                }
            })
            .collect_vec();

        if questions.is_empty() {
            return Err(Error::MapNotFound(name.to_owned()));
        }

        let answer_keys = answer_files
            .into_iter()
            .filter_map(|path| match AnswerKeyAsset::parse(path) {
                Ok(asset) => Some(asset),
                Err(error) => {
                    log::warn!("skipping answer asset of map \"{name}\": {error}");
                    None
                }
            })
            .collect_vec();

        Ok(Self {
            name: name.to_owned(),
            questions,
            answer_keys,
        })
    }

    /// The map's catalog name (directory name, lowercase)
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The map's name formatted for announcements
    pub fn display_name(&self) -> String {
        self.name.to_title_case()
    }

    /// The ordered question assets, defining quiz question order
    pub fn questions(&self) -> &[QuestionAsset] {
        &self.questions
    }

    /// The ordered answer-sheet assets
    pub fn answer_keys(&self) -> &[AnswerKeyAsset] {
        &self.answer_keys
    }

    /// The first answer sheet covering `area`, if any exists
    pub fn answer_key_for_area(&self, area: u32) -> Option<&AnswerKeyAsset> {
        self.answer_keys.iter().find(|key| key.area == area)
    }

    /// The number of questions in this map
    pub fn len(&self) -> usize {
        self.questions.len()
    }

    /// Whether the map has no questions (never true for a loaded map)
    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }
}

/// Filesystem-backed catalog of quiz maps
///
/// The catalog root contains one directory per map, each with `questions/`
/// and `answers/` subdirectories of image files.
#[derive(Debug, Clone)]
pub struct Catalog {
    root: PathBuf,
}

impl Catalog {
    /// Directory name holding a map's question images
    const QUESTIONS_DIR: &'static str = "questions";
    /// Directory name holding a map's answer-sheet images
    const ANSWERS_DIR: &'static str = "answers";

    /// Creates a catalog rooted at the given asset directory
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Lists the names of all installed maps, sorted
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if the catalog root cannot be listed.
    pub fn map_names(&self) -> Result<Vec<String>, Error> {
        Ok(std::fs::read_dir(&self.root)?
            .filter_map(Result::ok)
            .filter(|entry| entry.path().is_dir())
            .filter_map(|entry| entry.file_name().into_string().ok())
            .sorted()
            .collect_vec())
    }

    /// Picks a uniformly random installed map
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoMaps`] when the catalog is empty, or
    /// [`Error::Io`] if the root cannot be listed.
    pub fn random_map(&self) -> Result<String, Error> {
        let mut names = self.map_names()?;
        if names.is_empty() {
            return Err(Error::NoMaps);
        }
        Ok(names.swap_remove(fastrand::usize(..names.len())))
    }

    /// Loads a map by name
    ///
    /// # Errors
    ///
    /// Returns [`Error::MapNotFound`] if either asset directory is
    /// missing, empty, or yields no parseable question.
    pub fn load_map(&self, name: &str) -> Result<Map, Error> {
        let questions = self.list_assets(name, Self::QUESTIONS_DIR)?;
        let answers = self.list_assets(name, Self::ANSWERS_DIR)?;
        Map::from_listing(name, questions, answers)
    }

    fn list_assets(&self, map: &str, kind: &str) -> Result<Vec<PathBuf>, Error> {
        let dir = self.root.join(map).join(kind);
        let files = std::fs::read_dir(&dir)
            .map_err(|_| Error::MapNotFound(map.to_owned()))?
            .filter_map(Result::ok)
            .map(|entry| entry.path())
            .filter(|path| path.is_file())
            .sorted()
            .collect_vec();
        if files.is_empty() {
            return Err(Error::MapNotFound(map.to_owned()));
        }
        Ok(files)
    }
}

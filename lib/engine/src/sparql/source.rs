//! Retrieval of the RDF documents that are loaded by `LOAD`.

use oxrdfio::{RdfFormat, RdfParseError, RdfParser};
use rdf_update_model::{NamedNodeRef, Triple};
use rustc_hash::FxHashMap;
use std::error::Error;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

/// An error raised by an [RdfSource].
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum RdfSourceError {
    /// The document could not be retrieved.
    #[error(transparent)]
    Unavailable(Box<dyn Error + Send + Sync + 'static>),
    /// The document is not valid RDF.
    #[error(transparent)]
    Parsing(#[from] RdfParseError),
}

impl RdfSourceError {
    pub fn unavailable(error: impl Into<Box<dyn Error + Send + Sync + 'static>>) -> Self {
        Self::Unavailable(error.into())
    }
}

/// Retrieves the triples of the RDF document identified by an IRI.
///
/// A source must either return the complete document or fail. `LOAD` never inserts a partially
/// parsed document.
pub trait RdfSource {
    /// Retrieves and parses the document identified by `iri`.
    fn fetch(&self, iri: NamedNodeRef<'_>) -> Result<Vec<Triple>, RdfSourceError>;
}

impl<T: RdfSource + ?Sized> RdfSource for &T {
    fn fetch(&self, iri: NamedNodeRef<'_>) -> Result<Vec<Triple>, RdfSourceError> {
        (**self).fetch(iri)
    }
}

/// Parses a complete document. Blank nodes are renamed such that they do not clash with the blank
/// nodes already in the store.
pub fn parse_document(
    reader: impl Read,
    format: RdfFormat,
    base_iri: NamedNodeRef<'_>,
) -> Result<Vec<Triple>, RdfSourceError> {
    let parser = RdfParser::from_format(format)
        .with_base_iri(base_iri.as_str())
        .map_err(RdfSourceError::unavailable)?
        .rename_blank_nodes()
        .without_named_graphs();
    Ok(parser
        .for_reader(reader)
        .map(|quad| quad.map(Triple::from))
        .collect::<Result<Vec<_>, _>>()?)
}

/// Loads documents from the local file system. Only `file:` IRIs are supported.
///
/// The format is derived from the file extension.
#[derive(Debug, Clone, Default)]
pub struct FileRdfSource {
    base_dir: Option<PathBuf>,
}

impl FileRdfSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolves relative `file:` paths against `base_dir`.
    #[must_use]
    pub fn with_base_dir(mut self, base_dir: impl Into<PathBuf>) -> Self {
        self.base_dir = Some(base_dir.into());
        self
    }

    fn path(&self, iri: NamedNodeRef<'_>) -> Option<PathBuf> {
        let path = iri
            .as_str()
            .strip_prefix("file://")
            .or_else(|| iri.as_str().strip_prefix("file:"))?;
        let path = Path::new(path);
        Some(match &self.base_dir {
            Some(base_dir) if path.is_relative() => base_dir.join(path),
            _ => path.to_owned(),
        })
    }
}

impl RdfSource for FileRdfSource {
    fn fetch(&self, iri: NamedNodeRef<'_>) -> Result<Vec<Triple>, RdfSourceError> {
        let path = self.path(iri).ok_or_else(|| {
            RdfSourceError::unavailable(format!("{iri} is not a file IRI"))
        })?;
        let format = path
            .extension()
            .and_then(|ext| ext.to_str())
            .and_then(RdfFormat::from_extension)
            .ok_or_else(|| {
                RdfSourceError::unavailable(format!(
                    "The RDF format of {} cannot be derived from its extension",
                    path.display()
                ))
            })?;
        let file = File::open(&path).map_err(RdfSourceError::unavailable)?;
        parse_document(BufReader::new(file), format, iri)
    }
}

/// Serves documents that are held in memory.
///
/// ```
/// use oxrdfio::RdfFormat;
/// use rdf_update_engine::sparql::{RdfSource, StaticRdfSource};
/// use rdf_update_model::NamedNodeRef;
///
/// let iri = NamedNodeRef::new("http://example.com/data")?;
/// let source = StaticRdfSource::new().with_document(
///     iri,
///     RdfFormat::Turtle,
///     "<http://example.com/s> <http://example.com/p> \"o\" .",
/// );
/// assert_eq!(source.fetch(iri)?.len(), 1);
/// # Result::<_, Box<dyn std::error::Error>>::Ok(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct StaticRdfSource {
    documents: FxHashMap<String, (RdfFormat, String)>,
}

impl StaticRdfSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the document `content` under `iri`.
    #[must_use]
    pub fn with_document(
        mut self,
        iri: NamedNodeRef<'_>,
        format: RdfFormat,
        content: impl Into<String>,
    ) -> Self {
        self.documents
            .insert(iri.as_str().to_owned(), (format, content.into()));
        self
    }
}

impl RdfSource for StaticRdfSource {
    fn fetch(&self, iri: NamedNodeRef<'_>) -> Result<Vec<Triple>, RdfSourceError> {
        let (format, content) = self.documents.get(iri.as_str()).ok_or_else(|| {
            RdfSourceError::unavailable(format!("No document is registered for {iri}"))
        })?;
        parse_document(content.as_bytes(), *format, iri)
    }
}

/// Downloads documents over HTTP(S).
///
/// The format is taken from the `Content-Type` header and falls back to the extension of the
/// IRI path.
#[cfg(feature = "http-client")]
#[derive(Debug, Clone)]
pub struct HttpRdfSource {
    client: reqwest::blocking::Client,
}

#[cfg(feature = "http-client")]
impl HttpRdfSource {
    /// Creates a new [HttpRdfSource] whose requests time out after `timeout`.
    pub fn new(timeout: std::time::Duration) -> Result<Self, RdfSourceError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(RdfSourceError::unavailable)?;
        Ok(Self { client })
    }

    fn format(
        response: &reqwest::blocking::Response,
        iri: NamedNodeRef<'_>,
    ) -> Option<RdfFormat> {
        response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.split(';').next())
            .and_then(|media_type| RdfFormat::from_media_type(media_type.trim()))
            .or_else(|| {
                iri.as_str()
                    .rsplit_once('.')
                    .and_then(|(_, ext)| RdfFormat::from_extension(ext))
            })
    }
}

#[cfg(feature = "http-client")]
impl RdfSource for HttpRdfSource {
    fn fetch(&self, iri: NamedNodeRef<'_>) -> Result<Vec<Triple>, RdfSourceError> {
        let accept = [
            RdfFormat::Turtle,
            RdfFormat::NTriples,
            RdfFormat::RdfXml,
            RdfFormat::N3,
        ]
        .map(|format| format.media_type())
        .join(", ");
        let response = self
            .client
            .get(iri.as_str())
            .header(reqwest::header::ACCEPT, accept)
            .send()
            .and_then(reqwest::blocking::Response::error_for_status)
            .map_err(RdfSourceError::unavailable)?;
        let format = Self::format(&response, iri).ok_or_else(|| {
            RdfSourceError::unavailable(format!("The RDF format of {iri} is not supported"))
        })?;
        parse_document(response, format, iri)
    }
}

/// Routes each IRI to the source that handles its scheme.
///
/// `file:` IRIs are read from the file system. `http:` and `https:` IRIs are downloaded if the
/// `http-client` feature is enabled.
#[derive(Debug, Clone, Default)]
pub struct DefaultRdfSource {
    file: FileRdfSource,
    #[cfg(feature = "http-client")]
    http: Option<HttpRdfSource>,
}

impl DefaultRdfSource {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_file_source(mut self, file: FileRdfSource) -> Self {
        self.file = file;
        self
    }

    #[cfg(feature = "http-client")]
    #[must_use]
    pub fn with_http_source(mut self, http: HttpRdfSource) -> Self {
        self.http = Some(http);
        self
    }
}

impl RdfSource for DefaultRdfSource {
    fn fetch(&self, iri: NamedNodeRef<'_>) -> Result<Vec<Triple>, RdfSourceError> {
        let scheme = iri.as_str().split_once(':').map_or("", |(scheme, _)| scheme);
        match scheme {
            "file" => self.file.fetch(iri),
            #[cfg(feature = "http-client")]
            "http" | "https" => match &self.http {
                Some(http) => http.fetch(iri),
                None => HttpRdfSource::new(std::time::Duration::from_secs(30))?.fetch(iri),
            },
            _ => Err(RdfSourceError::unavailable(format!(
                "No RDF source is available for {iri}"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn static_source_renames_blank_nodes() {
        let iri = NamedNodeRef::new_unchecked("http://example.com/data");
        let source = StaticRdfSource::new().with_document(
            iri,
            RdfFormat::NTriples,
            "_:b <http://example.com/p> \"o\" .\n",
        );

        let first = source.fetch(iri).unwrap();
        let second = source.fetch(iri).unwrap();

        assert_eq!(first.len(), 1);
        assert_ne!(first, second);
    }

    #[test]
    fn static_source_missing_document_is_unavailable() {
        let source = StaticRdfSource::new();
        let result = source.fetch(NamedNodeRef::new_unchecked("http://example.com/missing"));
        assert!(matches!(result, Err(RdfSourceError::Unavailable(_))));
    }

    #[test]
    fn static_source_invalid_document_is_parse_error() {
        let iri = NamedNodeRef::new_unchecked("http://example.com/data");
        let source =
            StaticRdfSource::new().with_document(iri, RdfFormat::Turtle, "<s> <p> .");

        let result = source.fetch(iri);

        assert!(matches!(result, Err(RdfSourceError::Parsing(_))));
    }

    #[test]
    fn relative_turtle_iris_are_resolved_against_document() {
        let iri = NamedNodeRef::new_unchecked("http://example.com/data");
        let source = StaticRdfSource::new().with_document(
            iri,
            RdfFormat::Turtle,
            "<#s> <#p> <#o> .",
        );

        let triples = source.fetch(iri).unwrap();

        assert_eq!(
            triples[0].subject.to_string(),
            "<http://example.com/data#s>"
        );
    }

    #[test]
    fn file_source_missing_file_is_unavailable() {
        let source = FileRdfSource::new();
        let result = source.fetch(NamedNodeRef::new_unchecked(
            "file:///this/file/does/not/exist.ttl",
        ));
        assert!(matches!(result, Err(RdfSourceError::Unavailable(_))));
    }

    #[test]
    fn unsupported_scheme_is_unavailable() {
        let source = DefaultRdfSource::new();
        let result = source.fetch(NamedNodeRef::new_unchecked("urn:example:data"));
        assert!(matches!(result, Err(RdfSourceError::Unavailable(_))));
    }
}

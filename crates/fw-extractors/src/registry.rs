use std::collections::HashMap;
use std::sync::Arc;

use filewhisperer_types::Flavor;

use crate::{archive, email, html, ocr, pdf, qrcode, url, word, Analyzer, Extractor};

/// Static Flavor → (extractors, analyzers) mapping, built once per engine
/// and never mutated afterward.
#[derive(Clone)]
pub struct FlavorRegistry {
    extractors: HashMap<Flavor, Vec<Arc<dyn Extractor>>>,
    analyzers: HashMap<Flavor, Vec<Arc<dyn Analyzer>>>,
}

impl FlavorRegistry {
    /// The default extractor/analyzer table for every known flavor.
    pub fn standard() -> Self {
        let mut extractors: HashMap<Flavor, Vec<Arc<dyn Extractor>>> = HashMap::new();
        let mut analyzers: HashMap<Flavor, Vec<Arc<dyn Analyzer>>> = HashMap::new();

        extractors.insert(Flavor::TextPlain, vec![Arc::new(url::UrlExtractor)]);
        extractors.insert(Flavor::TextHtml, vec![Arc::new(html::HtmlExtractor)]);
        extractors.insert(
            Flavor::Image,
            vec![Arc::new(qrcode::QrCodeExtractor), Arc::new(ocr::OcrExtractor)],
        );
        extractors.insert(Flavor::CompressedFile, vec![Arc::new(archive::ArchiveExtractor)]);
        analyzers.insert(
            Flavor::CompressedFile,
            vec![Arc::new(archive::ArchiveAnalyzer)],
        );
        extractors.insert(Flavor::Doc, vec![Arc::new(word::WordExtractor)]);
        extractors.insert(Flavor::Docx, vec![Arc::new(word::WordExtractor)]);
        extractors.insert(Flavor::Pdf, vec![Arc::new(pdf::PdfExtractor)]);
        extractors.insert(Flavor::Email, vec![Arc::new(email::EmailExtractor)]);

        Self { extractors, analyzers }
    }

    pub fn extractors_for(&self, flavor: Flavor) -> &[Arc<dyn Extractor>] {
        self.extractors.get(&flavor).map_or(&[], Vec::as_slice)
    }

    pub fn analyzers_for(&self, flavor: Flavor) -> &[Arc<dyn Analyzer>] {
        self.analyzers.get(&flavor).map_or(&[], Vec::as_slice)
    }
}

impl Default for FlavorRegistry {
    fn default() -> Self {
        Self::standard()
    }
}

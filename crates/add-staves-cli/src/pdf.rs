//! PDF backend: imports score and staff pages as form XObjects and writes
//! output pages that draw them.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use add_staves_core::{Block, Canvas, PageSink, Rect};
use anyhow::{Context, bail};
use lopdf::content::{Content, Operation};
use lopdf::{Dictionary, Document, Object, ObjectId, Stream, dictionary};
use tracing::debug;

/// Inherited page attributes are looked up at most this many levels up.
const MAX_TREE_DEPTH: usize = 32;

/// Width of a staff page, matching the bundled `empty-<n>.pdf` files.
const STAFF_WIDTH: f64 = 538.582461;
/// Distance between two lines of one staff.
const LINE_GAP: f64 = 7.0;
/// Distance between the bottom line of a staff and the top line of the next.
const STAFF_GAP: f64 = 40.0;
/// Blank border above the first and below the last staff.
const STAFF_PAD: f64 = 12.0;

/// Empty-staff pages on disk, one file per staff count (`empty-<n>.pdf`).
#[derive(Debug, Clone)]
pub struct StaffCatalog {
    dir: PathBuf,
    draw_missing: bool,
}

impl StaffCatalog {
    /// Catalog in an explicit directory; a missing file is an error.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            draw_missing: false,
        }
    }

    /// Catalog in `staves/` next to the executable. Counts without a file
    /// there are drawn as plain five-line staves.
    pub fn bundled() -> Self {
        let dir = std::env::current_exe()
            .ok()
            .and_then(|exe| exe.parent().map(|d| d.join("staves")))
            .unwrap_or_else(|| PathBuf::from("staves"));
        Self::with_fallback(dir)
    }

    fn with_fallback(dir: PathBuf) -> Self {
        Self {
            dir,
            draw_missing: true,
        }
    }

    pub fn path(&self, staves: u8) -> PathBuf {
        self.dir.join(format!("empty-{}.pdf", staves))
    }

    pub fn load(&self, staves: u8) -> anyhow::Result<Document> {
        let path = self.path(staves);
        if self.draw_missing && !path.exists() {
            debug!(?path, staves, "no staff page on disk, drawing blank staves");
            return blank_staves(staves);
        }
        Document::load(&path).with_context(|| format!("read staff page {}", path.display()))
    }
}

/// One-page document holding `staves` empty five-line staves.
pub fn blank_staves(staves: u8) -> anyhow::Result<Document> {
    let count = f64::from(staves);
    let staff_height = 4.0 * LINE_GAP;
    let height =
        2.0 * STAFF_PAD + count * staff_height + (count - 1.0).max(0.0) * STAFF_GAP;

    let mut operations = vec![Operation::new("w", vec![real(0.5)])];
    for staff in 0..staves {
        let top = height - STAFF_PAD - f64::from(staff) * (staff_height + STAFF_GAP);
        for line in 0..5u8 {
            let y = top - f64::from(line) * LINE_GAP;
            operations.push(Operation::new("m", vec![real(0.0), real(y)]));
            operations.push(Operation::new("l", vec![real(STAFF_WIDTH), real(y)]));
        }
    }
    operations.push(Operation::new("S", vec![]));

    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let content_id = doc.add_object(Stream::new(
        Dictionary::new(),
        Content { operations }.encode()?,
    ));
    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "MediaBox" => rect_array(&Rect::from_size(STAFF_WIDTH, height)),
        "Contents" => content_id,
        "Resources" => Dictionary::new(),
    });
    install_page_tree(&mut doc, pages_id, vec![Object::Reference(page_id)]);
    Ok(doc)
}

/// Output document under construction. Source pages are imported as form
/// XObjects; every output page is a blank canvas that draws them.
pub struct PdfWriter {
    doc: Document,
    pages: Vec<PdfCanvas>,
}

impl PdfWriter {
    pub fn new() -> Self {
        Self {
            doc: Document::with_version("1.5"),
            pages: Vec::new(),
        }
    }

    /// Moves every object of `source` into the output and returns one form
    /// XObject id and crop box per source page, in page order. `on_page` runs
    /// once per imported page.
    pub fn import(
        &mut self,
        mut source: Document,
        mut on_page: impl FnMut(),
    ) -> anyhow::Result<Vec<(ObjectId, Rect)>> {
        source.renumber_objects_with(self.doc.max_id + 1);

        let mut forms = Vec::new();
        for page_id in source.get_pages().into_values() {
            let bbox = page_box(&source, page_id)
                .with_context(|| format!("page {:?} has no usable crop or media box", page_id))?;
            let content = page_content(&source, page_id)
                .with_context(|| format!("read content of page {:?}", page_id))?;
            let mut dict = dictionary! {
                "Type" => "XObject",
                "Subtype" => "Form",
                "BBox" => rect_array(&bbox),
            };
            if let Some(resources) = inherited(&source, page_id, b"Resources") {
                dict.set("Resources", resources.clone());
            }
            forms.push((dict, content, bbox));
            on_page();
        }

        // Source catalog, page tree and page streams become unreachable here
        // and are pruned on save.
        self.doc.max_id = self.doc.max_id.max(source.max_id);
        self.doc.objects.extend(source.objects);

        let imported = forms
            .into_iter()
            .map(|(dict, content, bbox)| (self.doc.add_object(Stream::new(dict, content)), bbox))
            .collect::<Vec<_>>();
        debug!(pages = imported.len(), "imported source pages");
        Ok(imported)
    }

    /// Imports the score; every page becomes one score block.
    pub fn import_score(
        &mut self,
        source: Document,
        on_page: impl FnMut(),
    ) -> anyhow::Result<Vec<Block<ObjectId>>> {
        let pages = self.import(source, on_page)?;
        Ok(pages
            .into_iter()
            .map(|(id, bbox)| Block::score(id, bbox))
            .collect())
    }

    /// Imports the first page of a staff document as the shared staff block.
    pub fn import_staff(&mut self, source: Document) -> anyhow::Result<Block<ObjectId>> {
        let pages = self.import(source, || {})?;
        match pages.into_iter().next() {
            Some((id, bbox)) => Ok(Block::staff(id, bbox)),
            None => bail!("staff document has no pages"),
        }
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Assembles the page tree and writes the document to `path`.
    pub fn save(self, path: &Path) -> anyhow::Result<()> {
        let file = File::create(path).with_context(|| format!("create {}", path.display()))?;
        let mut out = BufWriter::new(file);
        self.write_to(&mut out)
            .with_context(|| format!("write {}", path.display()))?;
        out.flush()
            .with_context(|| format!("write {}", path.display()))?;
        Ok(())
    }

    /// Assembles the page tree, drops objects no page reaches and writes the
    /// document to `out`.
    pub fn write_to<W: Write>(mut self, out: &mut W) -> anyhow::Result<()> {
        let pages_id = self.doc.new_object_id();
        let mut kids = Vec::with_capacity(self.pages.len());
        for canvas in std::mem::take(&mut self.pages) {
            let content = Content {
                operations: canvas.operations(),
            };
            let content_id = self
                .doc
                .add_object(Stream::new(Dictionary::new(), content.encode()?));
            let page = dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "MediaBox" => rect_array(&Rect::from_size(canvas.width, canvas.height)),
                "Contents" => content_id,
                "Resources" => dictionary! {
                    "XObject" => canvas.xobjects,
                },
            };
            kids.push(Object::Reference(self.doc.add_object(page)));
        }
        install_page_tree(&mut self.doc, pages_id, kids);

        let pruned = self.doc.prune_objects();
        debug!(objects = pruned.len(), "pruned unreachable objects");
        self.doc.compress();
        self.doc.save_to(out)?;
        Ok(())
    }
}

impl Default for PdfWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl PageSink<ObjectId> for PdfWriter {
    type Canvas = PdfCanvas;

    fn add_blank_page(&mut self, width: f64, height: f64) -> &mut PdfCanvas {
        let index = self.pages.len();
        self.pages.push(PdfCanvas::new(width, height));
        &mut self.pages[index]
    }
}

/// One output page: its size, the XObjects it uses, and one drawing group per
/// block. Later groups go underneath earlier ones.
pub struct PdfCanvas {
    width: f64,
    height: f64,
    xobjects: Dictionary,
    layers: Vec<Vec<Operation>>,
}

impl PdfCanvas {
    fn new(width: f64, height: f64) -> Self {
        Self {
            width,
            height,
            xobjects: Dictionary::new(),
            layers: Vec::new(),
        }
    }

    fn operations(&self) -> Vec<Operation> {
        self.layers.iter().rev().flatten().cloned().collect()
    }
}

impl Canvas<ObjectId> for PdfCanvas {
    fn draw_under(&mut self, block: &Block<ObjectId>, tx: f64, ty: f64) {
        let (num, generation) = block.key;
        let name = format!("X{}_{}", num, generation);
        self.xobjects.set(name.as_bytes().to_vec(), Object::Reference(block.key));
        let cm = [1.0, 0.0, 0.0, 1.0, tx, ty]
            .into_iter()
            .map(real)
            .collect::<Vec<_>>();
        self.layers.push(vec![
            Operation::new("q", vec![]),
            Operation::new("cm", cm),
            Operation::new("Do", vec![Object::Name(name.into_bytes())]),
            Operation::new("Q", vec![]),
        ]);
    }
}

/// Writes the `/Pages` node at `pages_id` with `kids`, a catalog pointing at
/// it, and sets the trailer root.
fn install_page_tree(doc: &mut Document, pages_id: ObjectId, kids: Vec<Object>) {
    let count = kids.len() as i64;
    let pages = dictionary! {
        "Type" => "Pages",
        "Kids" => kids,
        "Count" => Object::Integer(count),
    };
    doc.objects.insert(pages_id, Object::Dictionary(pages));
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
}

/// Decoded bytes of a stream; unfiltered streams are returned as stored.
fn stream_bytes(stream: &Stream) -> anyhow::Result<Vec<u8>> {
    if stream.dict.has(b"Filter") {
        Ok(stream.decompressed_content()?)
    } else {
        Ok(stream.content.clone())
    }
}

/// Concatenated content of a page. Streams of a `/Contents` array are
/// separated by a newline so tokens never run together.
fn page_content(doc: &Document, page_id: ObjectId) -> anyhow::Result<Vec<u8>> {
    let mut content = Vec::new();
    for id in doc.get_page_contents(page_id) {
        let stream = doc
            .get_object(id)
            .and_then(Object::as_stream)
            .with_context(|| format!("content stream {:?}", id))?;
        content.extend(stream_bytes(stream)?);
        content.push(b'\n');
    }
    Ok(content)
}

fn real(v: f64) -> Object {
    Object::Real(v as f32)
}

fn rect_array(r: &Rect) -> Vec<Object> {
    vec![real(r.left), real(r.bottom), real(r.right), real(r.top)]
}

fn number(obj: &Object) -> Option<f64> {
    match obj {
        Object::Integer(i) => Some(*i as f64),
        Object::Real(r) => Some(f64::from(*r)),
        _ => None,
    }
}

fn resolve<'a>(doc: &'a Document, obj: &'a Object) -> Option<&'a Object> {
    match obj {
        Object::Reference(id) => doc.get_object(*id).ok(),
        other => Some(other),
    }
}

/// Looks `key` up on the page, then on its ancestors in the page tree.
fn inherited<'a>(doc: &'a Document, page_id: ObjectId, key: &[u8]) -> Option<&'a Object> {
    let mut id = page_id;
    for _ in 0..MAX_TREE_DEPTH {
        let dict = doc.get_dictionary(id).ok()?;
        if let Ok(obj) = dict.get(key) {
            return Some(obj);
        }
        id = dict.get(b"Parent").ok()?.as_reference().ok()?;
    }
    None
}

fn rect_from(doc: &Document, obj: &Object) -> Option<Rect> {
    let array = resolve(doc, obj)?.as_array().ok()?;
    if array.len() != 4 {
        return None;
    }
    let mut v = [0.0; 4];
    for (slot, item) in v.iter_mut().zip(array) {
        *slot = number(resolve(doc, item)?)?;
    }
    // Normalise corner order; some producers write [x2 y2 x1 y1].
    Some(Rect::new(
        v[0].min(v[2]),
        v[1].min(v[3]),
        v[0].max(v[2]),
        v[1].max(v[3]),
    ))
}

/// Visible box of a page: the crop box, or the media box when there is none.
fn page_box(doc: &Document, page_id: ObjectId) -> Option<Rect> {
    inherited(doc, page_id, b"CropBox")
        .and_then(|obj| rect_from(doc, obj))
        .or_else(|| inherited(doc, page_id, b"MediaBox").and_then(|obj| rect_from(doc, obj)))
}

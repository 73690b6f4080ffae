use std::time::{Duration, Instant};

use commune_atlas::{
    Session,
    config::Padding,
    table::Bucket,
};
use geo::{BoundingRect, Contains, Coord, Intersects, MultiPolygon, Point, Polygon, Rect};
use ratatui::{
    Frame,
    layout::Rect as TuiRect,
    style::{Color, Style},
    widgets::{Block, Borders, canvas::{Canvas, Line}},
};

/// Kolor podświetlenia wybranej gminy.
const HIGHLIGHT: Color = Color::Rgb(255, 149, 0);
/// Przybliżony rozmiar komórki terminala w pikselach (marginesy są w pikselach).
const CELL_PX: (f64, f64) = (8.0, 16.0);

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Camera {
    pub center: Coord<f64>,
    pub zoom: f64,
}

#[derive(Clone, Copy, Debug)]
enum Viewport {
    Fit { bounds: Rect<f64>, padding: Padding, max_zoom: f64 },
    Camera(Camera),
}

#[derive(Clone, Copy, Debug)]
struct Flight {
    from: Camera,
    to: Camera,
    start: Instant,
    duration: Duration,
}

/// Dymek z nazwą gminy w miejscu kliknięcia.
#[derive(Clone, Debug)]
pub struct Popup {
    pub at: Coord<f64>,
    pub label: String,
}

struct Shape {
    id: String,
    name: String,
    color: Color,
    polygons: MultiPolygon<f64>,
}

/// Mapa gmin na kanwie z kamerą, podświetleniem i trafianiem kursorem.
pub struct MapView {
    shapes: Vec<Shape>,
    highlight: Option<String>,
    viewport: Viewport,
    flight: Option<Flight>,
    /// Ostatnio narysowany obszar wewnętrzny i zakresy, do przeliczania kliknięć.
    last_frame: Option<(TuiRect, [f64; 2], [f64; 2])>,
    last_camera: Option<Camera>,
}

fn bucket_color(bucket: Option<Bucket>) -> Color {
    match bucket {
        Some(Bucket::Near) => Color::Green,
        Some(Bucket::Medium) => Color::Yellow,
        Some(Bucket::Far) => Color::Red,
        Some(Bucket::All) | None => Color::White,
    }
}

impl MapView {
    pub fn new(session: &Session) -> Self {
        let shapes: Vec<Shape> = session
            .features()
            .iter()
            .filter_map(|f| {
                let polygons = f.geometry.polygons()?;
                Some(Shape {
                    id: f.id.clone(),
                    name: f.name.clone(),
                    color: bucket_color(session.bucket_of(&f.id)),
                    polygons,
                })
            })
            .collect();

        let map = &session.config().map;
        let [lon, lat] = map.initial_center;
        Self {
            shapes,
            highlight: None,
            viewport: Viewport::Camera(Camera {
                center: Coord { x: lon, y: lat },
                zoom: map.initial_zoom,
            }),
            flight: None,
            last_frame: None,
            last_camera: None,
        }
    }

    /// Liczba narysowanych gmin
    pub fn feature_count(&self) -> usize {
        self.shapes.len()
    }

    /// Zastępuje filtr podświetlenia; ponowne ustawienie tego samego id nic nie zmienia.
    pub fn set_highlight(&mut self, id: Option<String>) {
        self.highlight = id;
    }

    pub fn highlight(&self) -> Option<&str> {
        self.highlight.as_deref()
    }

    pub fn fit_bounds(&mut self, bounds: Rect<f64>, padding: Padding, max_zoom: f64) {
        self.flight = None;
        self.viewport = Viewport::Fit { bounds, padding, max_zoom };
    }

    pub fn fly_to(&mut self, center: Coord<f64>, zoom: f64, duration: Duration) {
        let to = Camera { center, zoom };
        let from = self.last_camera.unwrap_or(to);
        self.viewport = Viewport::Camera(to);
        self.flight = (!duration.is_zero()).then(|| Flight {
            from,
            to,
            start: Instant::now(),
            duration,
        });
    }

    /// Przesunięcie o ułamek szerokości/wysokości widoku.
    pub fn pan(&mut self, dx: f64, dy: f64) {
        if let (Some(cam), Some((_, xb, yb))) = (self.last_camera, self.last_frame) {
            let center = Coord {
                x: cam.center.x + dx * (xb[1] - xb[0]),
                y: cam.center.y + dy * (yb[1] - yb[0]),
            };
            self.flight = None;
            self.viewport = Viewport::Camera(Camera { center, ..cam });
        }
    }

    pub fn zoom_by(&mut self, delta: f64) {
        if let Some(cam) = self.last_camera {
            self.flight = None;
            self.viewport = Viewport::Camera(Camera {
                zoom: (cam.zoom + delta).clamp(1.0, 18.0),
                ..cam
            });
        }
    }

    /// Kamera dla obszaru `inner`, z uwzględnieniem trwającego przelotu.
    fn resolve(&mut self, inner: TuiRect, now: Instant) -> Camera {
        if let Some(flight) = self.flight {
            let t = now.duration_since(flight.start).as_secs_f64() / flight.duration.as_secs_f64();
            if t < 1.0 {
                let e = t * t * (3.0 - 2.0 * t);
                let lerp = |a: f64, b: f64| a + (b - a) * e;
                return Camera {
                    center: Coord {
                        x: lerp(flight.from.center.x, flight.to.center.x),
                        y: lerp(flight.from.center.y, flight.to.center.y),
                    },
                    zoom: lerp(flight.from.zoom, flight.to.zoom),
                };
            }
            self.flight = None;
        }
        match self.viewport {
            Viewport::Camera(cam) => cam,
            Viewport::Fit { bounds, padding, max_zoom } => fit_camera(bounds, padding, max_zoom, inner),
        }
    }

    /// Punkt na mapie pod komórką terminala.
    pub fn screen_to_lnglat(&self, column: u16, row: u16) -> Option<Coord<f64>> {
        let (inner, xb, yb) = self.last_frame?;
        if column < inner.x
            || row < inner.y
            || column >= inner.x + inner.width
            || row >= inner.y + inner.height
        {
            return None;
        }
        let fx = (f64::from(column - inner.x) + 0.5) / f64::from(inner.width);
        let fy = (f64::from(row - inner.y) + 0.5) / f64::from(inner.height);
        Some(Coord {
            x: xb[0] + fx * (xb[1] - xb[0]),
            y: yb[1] - fy * (yb[1] - yb[0]),
        })
    }

    /// Środek bieżącego widoku.
    pub fn center(&self) -> Option<Coord<f64>> {
        self.last_camera.map(|c| c.center)
    }

    /// Gmina narysowana w danym punkcie (pierwsza w kolejności danych).
    pub fn feature_at(&self, at: Coord<f64>) -> Option<(&str, &str)> {
        let point = Point::from(at);
        self.shapes
            .iter()
            .find(|s| s.polygons.contains(&point))
            .map(|s| (s.id.as_str(), s.name.as_str()))
    }

    /// Rysuje wszystkie granice w kolorze kubełka, potem wybraną gminę na wierzchu.
    pub fn render(&mut self, f: &mut Frame, area: TuiRect, title: &str, popup: Option<&Popup>) {
        let block = Block::default().title(title.to_string()).borders(Borders::ALL);
        let inner = block.inner(area);
        if inner.width == 0 || inner.height == 0 {
            f.render_widget(block, area);
            return;
        }

        let cam = self.resolve(inner, Instant::now());
        let (x_bounds, y_bounds) = camera_bounds(cam, inner);
        self.last_camera = Some(cam);
        self.last_frame = Some((inner, x_bounds, y_bounds));

        let visible = Rect::new(
            Coord { x: x_bounds[0], y: y_bounds[0] },
            Coord { x: x_bounds[1], y: y_bounds[1] },
        );
        let shapes = &self.shapes;
        let highlight = self.highlight.as_deref();

        let canvas = Canvas::default()
            .block(block)
            .x_bounds(x_bounds)
            .y_bounds(y_bounds)
            .paint(move |ctx| {
                for shape in shapes {
                    draw_outline(ctx, &shape.polygons, shape.color, &visible);
                }
                if let Some(sel) = highlight {
                    ctx.layer();
                    for shape in shapes.iter().filter(|s| s.id == sel) {
                        draw_outline(ctx, &shape.polygons, HIGHLIGHT, &visible);
                    }
                }
                if let Some(p) = popup {
                    ctx.print(p.at.x, p.at.y, ratatui::text::Line::styled(
                        format!("▸ {}", p.label),
                        Style::default().fg(Color::Black).bg(HIGHLIGHT),
                    ));
                }
            });
        f.render_widget(canvas, area);
    }
}

fn draw_outline(
    ctx: &mut ratatui::widgets::canvas::Context<'_>,
    polygons: &MultiPolygon<f64>,
    color: Color,
    visible: &Rect<f64>,
) {
    for poly in polygons.0.iter().filter(|p| overlaps(p, visible)) {
        for window in poly.exterior().0.windows(2) {
            let (a, b) = (window[0], window[1]);
            ctx.draw(&Line { x1: a.x, y1: a.y, x2: b.x, y2: b.y, color });
        }
    }
}

/// Czy zasięg wielokąta nachodzi na widok; reszta nie jest rysowana.
fn overlaps(poly: &Polygon<f64>, visible: &Rect<f64>) -> bool {
    poly.bounding_rect().is_some_and(|b| b.intersects(visible))
}

/// Zakresy kanwy dla kamery; komórka terminala jest dwa razy wyższa niż szersza.
fn camera_bounds(cam: Camera, inner: TuiRect) -> ([f64; 2], [f64; 2]) {
    let lon_span = 360.0 / 2f64.powf(cam.zoom);
    let lat_span = lon_span * (f64::from(inner.height) * 2.0) / f64::from(inner.width);
    (
        [cam.center.x - lon_span / 2.0, cam.center.x + lon_span / 2.0],
        [cam.center.y - lat_span / 2.0, cam.center.y + lat_span / 2.0],
    )
}

fn fit_camera(bounds: Rect<f64>, padding: Padding, max_zoom: f64, inner: TuiRect) -> Camera {
    let w = f64::from(inner.width);
    let h = f64::from(inner.height);
    let avail_w = (w - (padding.left + padding.right) / CELL_PX.0).max(1.0);
    let avail_h = (h - (padding.top + padding.bottom) / CELL_PX.1).max(1.0);

    let zoom_x = (360.0 * avail_w / (w * bounds.width())).log2();
    let zoom_y = (360.0 * 2.0 * avail_h / (w * bounds.height())).log2();
    // Zerowa szerokość daje nieskończoność, wtedy decyduje `max_zoom`.
    let zoom = zoom_x.min(zoom_y).min(max_zoom);
    Camera { center: bounds.center(), zoom }
}

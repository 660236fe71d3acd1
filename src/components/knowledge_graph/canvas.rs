use std::f64::consts::PI;

use wasm_bindgen::JsValue;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement};

use super::render::{Stroke, Surface};
use super::style::Rgba;
use super::types::{Point, ViewportSize};
use super::viewport::ViewTransform;

/// [`Surface`] backed by a 2D canvas context.
pub struct CanvasSurface<'a> {
	ctx: &'a CanvasRenderingContext2d,
}

impl<'a> CanvasSurface<'a> {
	/// Draw into `ctx`.
	pub fn new(ctx: &'a CanvasRenderingContext2d) -> Self {
		Self { ctx }
	}

	fn set_dash(&self, dashed: bool, width: f64) {
		let pattern = if dashed {
			js_sys::Array::of2(&JsValue::from_f64(width * 1.5), &JsValue::from_f64(width))
		} else {
			js_sys::Array::new()
		};
		let _ = self.ctx.set_line_dash(&pattern);
	}
}

impl Surface for CanvasSurface<'_> {
	fn clear(&mut self, size: ViewportSize, color: Rgba) {
		self.ctx.set_fill_style_str(&color.to_string());
		self.ctx.fill_rect(0.0, 0.0, size.width, size.height);
	}

	fn push_view(&mut self, transform: &ViewTransform) {
		self.ctx.save();
		let _ = self.ctx.translate(transform.pan.x, transform.pan.y);
		let _ = self.ctx.scale(transform.zoom, transform.zoom);
	}

	fn pop_view(&mut self) {
		self.ctx.restore();
	}

	fn line(&mut self, from: Point, to: Point, color: Rgba, width: f64) {
		let ctx = self.ctx;
		ctx.set_stroke_style_str(&color.to_string());
		ctx.set_line_width(width);
		ctx.begin_path();
		ctx.move_to(from.x, from.y);
		ctx.line_to(to.x, to.y);
		ctx.stroke();
	}

	fn circle(&mut self, center: Point, radius: f64, fill: Rgba, stroke: Option<Stroke>) {
		let ctx = self.ctx;
		ctx.begin_path();
		let _ = ctx.arc(center.x, center.y, radius, 0.0, 2.0 * PI);
		if fill.a > 0.0 {
			ctx.set_fill_style_str(&fill.to_string());
			ctx.fill();
		}
		if let Some(stroke) = stroke {
			ctx.set_stroke_style_str(&stroke.color.to_string());
			ctx.set_line_width(stroke.width);
			self.set_dash(stroke.dashed, stroke.width);
			ctx.stroke();
			if stroke.dashed {
				self.set_dash(false, 0.0);
			}
		}
	}

	fn glow(&mut self, center: Point, inner: f64, outer: f64, color: Rgba) {
		let ctx = self.ctx;
		let Ok(gradient) =
			ctx.create_radial_gradient(center.x, center.y, inner, center.x, center.y, outer)
		else {
			return;
		};
		let _ = gradient.add_color_stop(0.0, &color.to_string());
		let _ = gradient.add_color_stop(0.6, &color.with_alpha(color.a * 0.3).to_string());
		let _ = gradient.add_color_stop(1.0, &color.with_alpha(0.0).to_string());
		ctx.begin_path();
		let _ = ctx.arc(center.x, center.y, outer, 0.0, 2.0 * PI);
		#[allow(deprecated)]
		ctx.set_fill_style(&gradient);
		ctx.fill();
	}

	fn text(&mut self, at: Point, text: &str, size: f64, color: Rgba) {
		self.ctx.set_fill_style_str(&color.to_string());
		self.ctx.set_font(&format!("{size}px sans-serif"));
		let _ = self.ctx.fill_text(text, at.x, at.y);
	}
}

/// Static image formats the component can export.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExportFormat {
	/// Raster snapshot of the canvas.
	Png,
	/// Vector rendering of the current frame.
	Svg,
}

/// PNG data URL of the canvas as currently drawn.
pub fn snapshot_png(canvas: &HtmlCanvasElement) -> Result<String, JsValue> {
	canvas.to_data_url_with_type("image/png")
}

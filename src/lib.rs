pub mod config;
pub mod render;
pub mod triangle;

pub mod support {
    pub mod app;
    pub mod shader;
}

use anyhow::Result;
use config::Settings;
use gl::types::*;
use image::RgbaImage;
use render::{BACKGROUND_COLOR, LabelFont, RenderedTriangle, centered_origin};
use std::{mem, ptr};
use support::app::App;
use support::shader::ShaderProgram;
use triangle::{Triangle, format_measure};

const BLIT_VERTEX_SHADER: &str = r#"
#version 330 core
layout (location = 0) in vec2 position;
layout (location = 1) in vec2 uv;
uniform mat4 mvp;
out vec2 frag_uv;
void main() {
    frag_uv = uv;
    gl_Position = mvp * vec4(position, 0.0, 1.0);
}
"#;

const BLIT_FRAGMENT_SHADER: &str = r#"
#version 330 core
in vec2 frag_uv;
uniform sampler2D image;
out vec4 color;
void main() {
    color = texture(image, frag_uv);
}
"#;

/// A GL texture holding one of the rendered images, drawn at a fixed
/// position on the canvas.
pub struct Sprite {
    pub texture: GLuint,
    pub origin: (f32, f32),
    pub size: (f32, f32),
}

impl Sprite {
    pub fn upload(image: &RgbaImage, canvas: (u32, u32)) -> Self {
        let (width, height) = image.dimensions();
        let mut texture = 0;

        unsafe {
            gl::GenTextures(1, &mut texture);
            gl::BindTexture(gl::TEXTURE_2D, texture);
            gl::TexParameteri(gl::TEXTURE_2D, gl::TEXTURE_MIN_FILTER, gl::NEAREST as _);
            gl::TexParameteri(gl::TEXTURE_2D, gl::TEXTURE_MAG_FILTER, gl::NEAREST as _);
            gl::TexParameteri(gl::TEXTURE_2D, gl::TEXTURE_WRAP_S, gl::CLAMP_TO_EDGE as _);
            gl::TexParameteri(gl::TEXTURE_2D, gl::TEXTURE_WRAP_T, gl::CLAMP_TO_EDGE as _);
            gl::PixelStorei(gl::UNPACK_ALIGNMENT, 1);
            gl::TexImage2D(
                gl::TEXTURE_2D,
                0,
                gl::RGBA8 as _,
                width as _,
                height as _,
                0,
                gl::RGBA,
                gl::UNSIGNED_BYTE,
                image.as_raw().as_ptr() as *const GLvoid,
            );
        }

        Self {
            texture,
            origin: centered_origin(canvas, (width, height)),
            size: (width as f32, height as f32),
        }
    }

    fn model(&self) -> nalgebra_glm::Mat4 {
        let translated = nalgebra_glm::translate(
            &nalgebra_glm::Mat4::identity(),
            &nalgebra_glm::vec3(self.origin.0, self.origin.1, 0.0),
        );
        nalgebra_glm::scale(&translated, &nalgebra_glm::vec3(self.size.0, self.size.1, 1.0))
    }
}

impl Drop for Sprite {
    fn drop(&mut self) {
        unsafe {
            gl::DeleteTextures(1, &self.texture);
        }
    }
}

pub struct Scene {
    pub projection: nalgebra_glm::Mat4,
    pub vao: GLuint,
    pub vbo: GLuint,
    pub ibo: GLuint,
    pub shader_program: ShaderProgram,
    pub mvp_location: GLint,
    pub shape: Sprite,
    pub labels: Sprite,
}

impl Scene {
    pub fn new(rendered: &RenderedTriangle, canvas: (u32, u32)) -> Result<Self> {
        let mut vao = 0;
        let mut vbo = 0;
        let mut ibo = 0;

        unsafe {
            gl::GenVertexArrays(1, &mut vao);
            gl::BindVertexArray(vao);

            gl::GenBuffers(1, &mut vbo);
            gl::BindBuffer(gl::ARRAY_BUFFER, vbo);
            gl::BufferData(
                gl::ARRAY_BUFFER,
                mem::size_of_val(&QUAD) as GLsizeiptr,
                bytemuck::cast_slice::<Vertex, u8>(&QUAD).as_ptr() as *const GLvoid,
                gl::STATIC_DRAW,
            );

            gl::GenBuffers(1, &mut ibo);
            gl::BindBuffer(gl::ELEMENT_ARRAY_BUFFER, ibo);
            gl::BufferData(
                gl::ELEMENT_ARRAY_BUFFER,
                mem::size_of_val(&INDICES) as GLsizeiptr,
                INDICES.as_ptr() as *const GLvoid,
                gl::STATIC_DRAW,
            );

            let stride = mem::size_of::<Vertex>() as GLsizei;
            gl::VertexAttribPointer(0, 2, gl::FLOAT, gl::FALSE, stride, ptr::null());
            gl::EnableVertexAttribArray(0);
            gl::VertexAttribPointer(
                1,
                2,
                gl::FLOAT,
                gl::FALSE,
                stride,
                (2 * mem::size_of::<f32>()) as *const _,
            );
            gl::EnableVertexAttribArray(1);
        }

        let mut shader_program = ShaderProgram::new();
        shader_program
            .vertex_shader(BLIT_VERTEX_SHADER)?
            .fragment_shader(BLIT_FRAGMENT_SHADER)?
            .link()?;

        let mvp_location = shader_program.uniform_location("mvp")?;

        Ok(Self {
            projection: pixel_projection(canvas),
            vao,
            vbo,
            ibo,
            shader_program,
            mvp_location,
            shape: Sprite::upload(&rendered.shape_image, canvas),
            labels: Sprite::upload(&rendered.label_overlay, canvas),
        })
    }

    pub fn render(&self) {
        let [r, g, b, _] = BACKGROUND_COLOR.0.map(|channel| channel as f32 / 255.0);

        unsafe {
            gl::Disable(gl::DEPTH_TEST);
            gl::Enable(gl::BLEND);
            gl::BlendFunc(gl::SRC_ALPHA, gl::ONE_MINUS_SRC_ALPHA);

            gl::ClearColor(r, g, b, 1.0);
            gl::Clear(gl::COLOR_BUFFER_BIT);
        }

        self.shader_program.activate();

        unsafe {
            gl::BindVertexArray(self.vao);
            gl::ActiveTexture(gl::TEXTURE0);
        }

        for sprite in [&self.shape, &self.labels] {
            let mvp = self.projection * sprite.model();
            unsafe {
                gl::UniformMatrix4fv(self.mvp_location, 1, gl::FALSE, mvp.as_ptr());
                gl::BindTexture(gl::TEXTURE_2D, sprite.texture);
                gl::DrawElements(
                    gl::TRIANGLES,
                    INDICES.len() as _,
                    gl::UNSIGNED_INT,
                    ptr::null(),
                );
            }
        }
    }
}

impl Drop for Scene {
    fn drop(&mut self) {
        unsafe {
            gl::DeleteBuffers(1, &self.ibo);
            gl::DeleteBuffers(1, &self.vbo);
            gl::DeleteVertexArrays(1, &self.vao);
        }
    }
}

/// Maps canvas pixels to clip space with the origin at the top left.
pub fn pixel_projection((width, height): (u32, u32)) -> nalgebra_glm::Mat4 {
    nalgebra_glm::ortho(0.0, width as f32, height as f32, 0.0, -1.0, 1.0)
}

#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
struct Vertex {
    position: [f32; 2],
    uv: [f32; 2],
}

const QUAD: [Vertex; 4] = [
    Vertex {
        position: [0.0, 0.0],
        uv: [0.0, 0.0],
    },
    Vertex {
        position: [1.0, 0.0],
        uv: [1.0, 0.0],
    },
    Vertex {
        position: [1.0, 1.0],
        uv: [1.0, 1.0],
    },
    Vertex {
        position: [0.0, 1.0],
        uv: [0.0, 1.0],
    },
];

const INDICES: [u32; 6] = [0, 1, 2, 2, 3, 0];

pub struct TriangleApp {
    settings: Settings,
    triangle: Triangle,
    scene: Option<Scene>,
}

impl TriangleApp {
    pub fn new(settings: Settings, triangle: Triangle) -> Self {
        Self {
            settings,
            triangle,
            scene: None,
        }
    }
}

impl App for TriangleApp {
    fn initialize(&mut self) -> Result<()> {
        let font = match &self.settings.font.path {
            Some(path) => LabelFont::load(path, self.settings.font.size)?,
            None => LabelFont::embedded(self.settings.font.size)?,
        };
        let rendered = render::render(&self.triangle, &font);
        self.scene = Some(Scene::new(&rendered, self.settings.canvas_size())?);
        Ok(())
    }

    fn render(&mut self, _time: f32) -> Result<()> {
        if let Some(scene) = &self.scene {
            scene.render();
        }
        Ok(())
    }

    fn render_ui(&mut self, ctx: &egui::Context) -> Result<()> {
        let sides = self.triangle.sides();
        let angles = self.triangle.angles();

        egui::Window::new("Measurements")
            .anchor(egui::Align2::LEFT_TOP, [10.0, 10.0])
            .resizable(false)
            .default_open(false)
            .show(ctx, |ui| {
                egui::Grid::new("measurements").striped(true).show(ui, |ui| {
                    for (name, value) in [
                        ("Opposite", sides.opposite),
                        ("Adjacent", sides.adjacent),
                        ("Hypotenuse", sides.hypotenuse),
                        ("Adjacent angle", angles.adjacent),
                        ("Opposite angle", angles.opposite),
                        ("Right angle", angles.right_angle),
                        ("Area", self.triangle.area()),
                        ("Perimeter", self.triangle.perimeter()),
                    ] {
                        ui.label(name);
                        ui.label(egui::RichText::new(format_measure(value)).monospace());
                        ui.end_row();
                    }
                });
            });

        Ok(())
    }

    fn cleanup(&mut self) -> Result<()> {
        self.scene = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn projection_maps_canvas_corners_to_clip_space() {
        let projection = pixel_projection((1200, 800));
        let top_left = projection * nalgebra_glm::vec4(0.0, 0.0, 0.0, 1.0);
        let bottom_right = projection * nalgebra_glm::vec4(1200.0, 800.0, 0.0, 1.0);
        assert!((top_left.x + 1.0).abs() < 1e-6 && (top_left.y - 1.0).abs() < 1e-6);
        assert!((bottom_right.x - 1.0).abs() < 1e-6 && (bottom_right.y + 1.0).abs() < 1e-6);
    }
}

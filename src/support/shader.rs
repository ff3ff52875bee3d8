use anyhow::{Result, anyhow};
pub use gl::types::*;
use std::ffi::CString;
use std::ptr;

pub enum ShaderKind {
    Vertex,
    Fragment,
}

pub struct Shader {
    pub id: GLuint,
}

impl Shader {
    pub fn new(kind: ShaderKind) -> Shader {
        let kind = match kind {
            ShaderKind::Vertex => gl::VERTEX_SHADER,
            ShaderKind::Fragment => gl::FRAGMENT_SHADER,
        };
        Shader {
            id: unsafe { gl::CreateShader(kind) },
        }
    }

    pub fn compile(&mut self, source: &str) -> Result<()> {
        let source = CString::new(source.as_bytes())
            .map_err(|error| anyhow!("Shader source contains null byte: {}", error))?;

        unsafe {
            gl::ShaderSource(self.id, 1, &source.as_ptr(), ptr::null());
            gl::CompileShader(self.id);

            let mut success = 0;
            gl::GetShaderiv(self.id, gl::COMPILE_STATUS, &mut success);
            if success == 0 {
                let log = info_log(self.id, gl::GetShaderiv, gl::GetShaderInfoLog);
                gl::DeleteShader(self.id);
                return Err(anyhow!("Shader compilation failed:\n{}", log));
            }
        }
        Ok(())
    }
}

pub struct ShaderProgram {
    pub id: GLuint,
    shader_ids: Vec<GLuint>,
}

impl ShaderProgram {
    pub fn new() -> Self {
        ShaderProgram {
            id: unsafe { gl::CreateProgram() },
            shader_ids: Vec::new(),
        }
    }

    fn attach(&mut self, kind: ShaderKind, source: &str) -> Result<&mut Self> {
        let mut shader = Shader::new(kind);
        shader.compile(source)?;
        unsafe {
            gl::AttachShader(self.id, shader.id);
        }
        self.shader_ids.push(shader.id);
        Ok(self)
    }

    pub fn vertex_shader(&mut self, source: &str) -> Result<&mut Self> {
        self.attach(ShaderKind::Vertex, source)
    }

    pub fn fragment_shader(&mut self, source: &str) -> Result<&mut Self> {
        self.attach(ShaderKind::Fragment, source)
    }

    pub fn link(&mut self) -> Result<()> {
        unsafe {
            gl::LinkProgram(self.id);

            for id in self.shader_ids.drain(..) {
                gl::DeleteShader(id);
            }

            let mut success = 0;
            gl::GetProgramiv(self.id, gl::LINK_STATUS, &mut success);
            if success == 0 {
                let log = info_log(self.id, gl::GetProgramiv, gl::GetProgramInfoLog);
                return Err(anyhow!("Shader program linking failed:\n{}", log));
            }
        }
        Ok(())
    }

    pub fn activate(&self) {
        unsafe {
            gl::UseProgram(self.id);
        }
    }

    pub fn uniform_location(&self, name: &str) -> Result<GLint> {
        let c_name = CString::new(name.as_bytes())
            .map_err(|error| anyhow!("Uniform name contains null byte: {}", error))?;
        let location = unsafe { gl::GetUniformLocation(self.id, c_name.as_ptr()) };
        if location < 0 {
            return Err(anyhow!("Uniform '{}' not found in shader program", name));
        }
        Ok(location)
    }
}

impl Default for ShaderProgram {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for ShaderProgram {
    fn drop(&mut self) {
        unsafe { gl::DeleteProgram(self.id) }
    }
}

type GetIv = unsafe fn(GLuint, GLenum, *mut GLint);
type GetInfoLog = unsafe fn(GLuint, GLsizei, *mut GLsizei, *mut GLchar);

unsafe fn info_log(id: GLuint, get_iv: GetIv, get_log: GetInfoLog) -> String {
    let mut length = 0;
    unsafe { get_iv(id, gl::INFO_LOG_LENGTH, &mut length) };
    if length <= 0 {
        return "no error message".to_string();
    }

    let mut buffer = vec![0u8; length as usize];
    unsafe { get_log(id, length, ptr::null_mut(), buffer.as_mut_ptr() as *mut GLchar) };
    String::from_utf8_lossy(&buffer[..length as usize - 1]).into_owned()
}

//! Mono/stereo resource handles.
//!
//! Every resource the application sees is a [`DualResource`]: a shared handle over either one
//! underlying device object or a left/right pair. Binding slots hold clones, so the slot count
//! is the reference count and the underlying objects drop with the last slot.

use std::fmt;
use std::sync::Arc;

use parallax_view::Eye;

use crate::native::NativeDevice;
use crate::registers::ShaderRules;

pub type StereoSurface<D> = DualResource<<D as NativeDevice>::Surface>;
pub type StereoTexture<D> = DualResource<<D as NativeDevice>::Texture>;
pub type StereoVertexBuffer<D> = DualResource<<D as NativeDevice>::VertexBuffer>;
pub type StereoIndexBuffer<D> = DualResource<<D as NativeDevice>::IndexBuffer>;
pub type VertexShaderHandle<D> = ProxyShader<<D as NativeDevice>::VertexShader>;
pub type PixelShaderHandle<D> = ProxyShader<<D as NativeDevice>::PixelShader>;
pub type VertexDeclarationHandle<D> = Arc<<D as NativeDevice>::VertexDeclaration>;

/// The underlying device objects behind a [`DualResource`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Surfaces<T> {
    Mono(T),
    Stereo { left: T, right: T },
}

pub struct DualResource<T> {
    inner: Arc<Surfaces<T>>,
}

impl<T> DualResource<T> {
    pub fn mono(left: T) -> Self {
        Self::from_surfaces(Surfaces::Mono(left))
    }

    pub fn stereo(left: T, right: T) -> Self {
        Self::from_surfaces(Surfaces::Stereo { left, right })
    }

    /// Stereo when `right` is present, mono otherwise.
    pub fn from_parts(left: T, right: Option<T>) -> Self {
        match right {
            Some(right) => Self::stereo(left, right),
            None => Self::mono(left),
        }
    }

    pub fn from_surfaces(surfaces: Surfaces<T>) -> Self {
        Self {
            inner: Arc::new(surfaces),
        }
    }

    pub fn surfaces(&self) -> &Surfaces<T> {
        &self.inner
    }

    /// The left instance; authoritative for every mono operation.
    pub fn left(&self) -> &T {
        match &*self.inner {
            Surfaces::Mono(left) | Surfaces::Stereo { left, .. } => left,
        }
    }

    pub fn right(&self) -> Option<&T> {
        match &*self.inner {
            Surfaces::Mono(_) => None,
            Surfaces::Stereo { right, .. } => Some(right),
        }
    }

    pub fn is_stereo(&self) -> bool {
        matches!(&*self.inner, Surfaces::Stereo { .. })
    }

    /// The instance to bind while rendering `eye`. Mono resources serve both eyes.
    pub fn for_eye(&self, eye: Eye) -> &T {
        match (&*self.inner, eye) {
            (Surfaces::Stereo { right, .. }, Eye::Right) => right,
            _ => self.left(),
        }
    }

    pub fn ptr_eq(a: &Self, b: &Self) -> bool {
        Arc::ptr_eq(&a.inner, &b.inner)
    }

    /// Number of live handles (binding slots plus application references).
    pub fn ref_count(&self) -> usize {
        Arc::strong_count(&self.inner)
    }
}

impl<T> Clone for DualResource<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

/// Identity comparison: two handles are equal when they name the same resource.
impl<T> PartialEq for DualResource<T> {
    fn eq(&self, other: &Self) -> bool {
        Self::ptr_eq(self, other)
    }
}

impl<T> Eq for DualResource<T> {}

impl<T: fmt::Debug> fmt::Debug for DualResource<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("DualResource").field(&*self.inner).finish()
    }
}

struct ShaderInner<S> {
    actual: S,
    rules: Arc<ShaderRules>,
}

/// A device shader together with the constant modification rules chosen for it at creation.
pub struct ProxyShader<S> {
    inner: Arc<ShaderInner<S>>,
}

impl<S> ProxyShader<S> {
    pub fn new(actual: S, rules: ShaderRules) -> Self {
        Self {
            inner: Arc::new(ShaderInner {
                actual,
                rules: Arc::new(rules),
            }),
        }
    }

    pub fn actual(&self) -> &S {
        &self.inner.actual
    }

    pub fn rules(&self) -> &Arc<ShaderRules> {
        &self.inner.rules
    }

    pub fn ref_count(&self) -> usize {
        Arc::strong_count(&self.inner)
    }
}

impl<S> Clone for ProxyShader<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<S> PartialEq for ProxyShader<S> {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl<S: fmt::Debug> fmt::Debug for ProxyShader<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProxyShader")
            .field("actual", &self.inner.actual)
            .field("rules", &self.inner.rules.len())
            .finish()
    }
}

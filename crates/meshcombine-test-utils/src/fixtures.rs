//! Shorthand constructors for test inputs.

use meshcombine::{MaterialKey, MeshHandle, MeshRef, Renderable, TransformRef};

/// A renderable with a mesh handle derived from its material.
pub fn renderable(id: &str, material: u64, vertex_count: u32) -> Renderable {
    Renderable::new(
        id,
        MaterialKey::labeled(material, material_label(material)),
        vertex_count,
        Some(MeshRef::Asset(MeshHandle(material))),
        TransformRef::Node(0),
    )
}

/// `count` renderables named `{prefix}{i}` with the same material and size.
pub fn renderables(prefix: &str, material: u64, count: usize, vertex_count: u32) -> Vec<Renderable> {
    (0..count)
        .map(|i| renderable(&format!("{prefix}{i}"), material, vertex_count))
        .collect()
}

/// A renderable with no mesh attached.
pub fn missing_mesh(id: &str, material: u64) -> Renderable {
    Renderable::new(
        id,
        MaterialKey::labeled(material, material_label(material)),
        0,
        None,
        TransformRef::Node(0),
    )
}

/// The label fixtures attach to material `id`.
pub fn material_label(id: u64) -> String {
    format!("material-{id}")
}

use crate::gpu::device::{
    BufferDescriptor, BufferId, BufferKind, BufferUsage, DeviceError, ResourceId, SharedDevice,
    VertexArrayId, try_borrow_device,
};
use crate::gpu::layout::VertexLayout;
use crate::scene::mesh::MeshData;
use log::{debug, warn};
use std::fmt;

/// Owns one device handle and releases it when dropped.
pub struct GpuResource<H: Copy + Into<ResourceId>> {
    device: SharedDevice,
    handle: H,
}

impl<H: Copy + Into<ResourceId>> GpuResource<H> {
    /// Takes ownership of `handle`, which must have been created on `device`.
    pub fn new(device: &SharedDevice, handle: H) -> Self {
        Self {
            device: device.clone(),
            handle,
        }
    }

    pub fn handle(&self) -> H {
        self.handle
    }

    pub fn device(&self) -> &SharedDevice {
        &self.device
    }
}

impl<H: Copy + Into<ResourceId> + fmt::Debug> fmt::Debug for GpuResource<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("GpuResource").field(&self.handle).finish()
    }
}

impl<H: Copy + Into<ResourceId>> Drop for GpuResource<H> {
    fn drop(&mut self) {
        let resource = self.handle.into();
        match self.device.try_borrow_mut() {
            Ok(mut device) => device.release(resource),
            Err(_) => warn!("device busy, leaking {:?}", resource),
        }
    }
}

/// The vertex buffer, index buffer and vertex array of one drawable.
#[derive(Debug)]
pub struct MeshBuffers {
    pub vertex_array: GpuResource<VertexArrayId>,
    pub vertex_buffer: GpuResource<BufferId>,
    pub index_buffer: GpuResource<BufferId>,
    pub index_count: usize,
}

/// Uploads `mesh` as static buffers and describes it with `layout`.
///
/// Anything created before a failing step is released on the way out.
pub fn upload_mesh(
    device: &SharedDevice,
    mesh: &MeshData,
    layout: &VertexLayout,
) -> Result<MeshBuffers, DeviceError> {
    let vertex_id = try_borrow_device(device)?.create_buffer(
        &BufferDescriptor {
            label: "mesh vertices",
            kind: BufferKind::Vertex,
            usage: BufferUsage::Static,
        },
        bytemuck::cast_slice(&mesh.vertices),
    )?;
    let vertex_buffer = GpuResource::new(device, vertex_id);

    let index_id = try_borrow_device(device)?.create_buffer(
        &BufferDescriptor {
            label: "mesh indices",
            kind: BufferKind::Index,
            usage: BufferUsage::Static,
        },
        bytemuck::cast_slice(&mesh.indices),
    )?;
    let index_buffer = GpuResource::new(device, index_id);

    let vertex_array_id =
        try_borrow_device(device)?.create_vertex_array(layout, vertex_id, Some(index_id))?;
    let vertex_array = GpuResource::new(device, vertex_array_id);

    debug!(
        "uploaded mesh: {} vertices, {} indices",
        mesh.vertices.len(),
        mesh.indices.len()
    );

    Ok(MeshBuffers {
        vertex_array,
        vertex_buffer,
        index_buffer,
        index_count: mesh.indices.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gpu::SoftwareDevice;
    use crate::scene::mesh::MeshKind;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn upload_on_a_borrowed_device_reports_busy() {
        let device: SharedDevice = Rc::new(RefCell::new(SoftwareDevice::new(8, 8, 1)));
        let mesh = MeshData::generate(MeshKind::Triangle);

        let held = device.borrow();
        let result = upload_mesh(&device, &mesh, &VertexLayout::flat());
        assert_eq!(result.err(), Some(DeviceError::Busy));
        drop(held);

        assert!(upload_mesh(&device, &mesh, &VertexLayout::flat()).is_ok());
    }
}

//! gRPC 反射
//!
//! 由编译期生成的文件描述符集构建反射服务

use tonic_reflection::server::v1::{ServerReflection, ServerReflectionServer};
use tonic_reflection::server::{Builder, Error};

/// 构建包含指定文件描述符集的反射服务
pub fn build_reflection(
    file_descriptor_sets: &[&'static [u8]],
) -> Result<ServerReflectionServer<impl ServerReflection>, Error> {
    let builder = file_descriptor_sets
        .iter()
        .fold(Builder::configure(), |builder, fds| {
            builder.register_encoded_file_descriptor_set(*fds)
        });
    builder.build_v1()
}

use std::env;
use std::path::PathBuf;

const ERP_PROTOS: [&str; 8] = [
    "../../proto/erp/v1/entity.proto",
    "../../proto/erp/v1/finance.proto",
    "../../proto/erp/v1/inventory.proto",
    "../../proto/erp/v1/workflow.proto",
    "../../proto/erp/v1/notice.proto",
    "../../proto/erp/v1/log.proto",
    "../../proto/erp/v1/payroll.proto",
    "../../proto/erp/v1/preference.proto",
];

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let out_dir = PathBuf::from(env::var("OUT_DIR")?);

    // 公共消息只生成类型
    tonic_build::configure()
        .build_server(false)
        .build_client(false)
        .compile_protos(&["../../proto/common/v1/base.proto"], &["../../proto"])?;

    // ERP 服务引用公共消息
    tonic_build::configure()
        .build_server(true)
        .build_client(false)
        .file_descriptor_set_path(out_dir.join("erp_descriptor.bin"))
        .extern_path(".common.v1", "crate::common::v1")
        .compile_protos(&ERP_PROTOS, &["../../proto"])?;

    println!("cargo:rerun-if-changed=../../proto");
    Ok(())
}

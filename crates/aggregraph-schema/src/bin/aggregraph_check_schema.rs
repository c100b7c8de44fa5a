use std::env;

use aggregraph_schema::SchemaDocument;

fn main() {
    let mut args = env::args().skip(1);
    let Some(path) = args.next() else {
        eprintln!("usage: aggregraph_check_schema <schema.json>");
        std::process::exit(2);
    };
    if args.next().is_some() {
        eprintln!("usage: aggregraph_check_schema <schema.json>");
        std::process::exit(2);
    }

    match SchemaDocument::from_json_file(&path) {
        Ok(doc) => {
            println!(
                "ok(schema): application={} aggregates={} shapes={} enums={}",
                doc.application_name,
                doc.aggregates.len(),
                doc.shapes.len(),
                doc.enums.len()
            );
        }
        Err(err) => {
            eprintln!("{err}");
            std::process::exit(1);
        }
    }
}

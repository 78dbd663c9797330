use anyhow::Result;
use colored::*;
use rustyline::{error::ReadlineError, DefaultEditor};
use vsl::{core::runtime::capture_output, Reply, Shell, ShellConfig};

pub fn run(config: ShellConfig) -> Result<()> {
    let mut shell = Shell::new(config);
    let mut editor = DefaultEditor::new()?;

    println!("{}", Shell::banner());

    loop {
        match editor.readline(shell.prompt()) {
            Ok(line) => {
                if !line.trim().is_empty() {
                    let _ = editor.add_history_entry(line.as_str());
                }

                let (reply, out) = capture_output(|| shell.feed_line(&line));
                print!("{}", out);
                if !out.is_empty() && !out.ends_with('\n') {
                    println!();
                }

                match reply {
                    Ok(Reply::Quit) => break,
                    Ok(Reply::Output(text)) => {
                        print!("{}", text);
                        if !text.ends_with('\n') {
                            println!();
                        }
                    }
                    Ok(Reply::Executed(value)) => println!("{}", format!("=> {:?}", value).cyan()),
                    Ok(Reply::Idle | Reply::More | Reply::Accepted) => {}
                    Err(err) => eprintln!("{}", format!("{:#}", err).red()),
                }
            }
            Err(ReadlineError::Interrupted) => {
                shell.interrupt();
                println!("KeyboardInterrupt. Use Ctrl-D to exit.");
            }
            Err(ReadlineError::Eof) => break,
            Err(err) => return Err(err.into()),
        }
    }

    println!("Good Bye");
    Ok(())
}

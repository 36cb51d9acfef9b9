// Archivo: generation.rs
// Propósito: crear una secuencia completa a partir de un puesto y una
// empresa pidiendo los pasos al generador.
use crate::errors::{ChatError, Result};
use crate::prompts::{sequence_prompt, system_prompt};
use crate::provider::{GenerationRequest, TextGenerator};
use action_protocol::{parse_generated_steps, SequenceService};
use log::{error, info};
use outreach_domain::{EventSink, SequenceRepository, SequenceView};
use std::sync::Arc;
use uuid::Uuid;

pub struct SequenceGenerationService<R, G>
    where R: SequenceRepository + ?Sized,
          G: TextGenerator + ?Sized
{
    sequences: SequenceService<R>,
    generator: Arc<G>,
}

impl<R, G> SequenceGenerationService<R, G>
    where R: SequenceRepository + ?Sized,
          G: TextGenerator + ?Sized
{
    pub fn new(repo: Arc<R>, generator: Arc<G>, sink: Arc<dyn EventSink>) -> Self {
        Self { sequences: SequenceService::new(repo, sink),
               generator }
    }

    /// Genera y guarda "<puesto> at <empresa>" con los pasos devueltos,
    /// numerados 1..N. Si la respuesta no trae pasos no se crea nada.
    pub fn generate(&self,
                    owner_id: &Uuid,
                    job_title: &str,
                    company_name: &str,
                    details: Option<&str>)
                    -> Result<SequenceView> {
        let (job_title, company_name) = (job_title.trim(), company_name.trim());
        if job_title.is_empty() || company_name.is_empty() {
            return Err(ChatError::Validation("Job title and company name are required".into()));
        }
        info!("generando secuencia para {} en {}", job_title, company_name);
        let request = GenerationRequest { system: system_prompt(),
                                          history: Vec::new(),
                                          prompt: sequence_prompt(job_title, company_name, details) };
        let response = self.generator.generate(&request).map_err(|e| {
                                                            error!("fallo del generador: {}", e);
                                                            e
                                                        })?;
        let records = parse_generated_steps(&response)?;
        Ok(self.sequences.generate_sequence(owner_id, job_title, company_name, &records)?)
    }
}
